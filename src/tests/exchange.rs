use thornmere_math::Vec3;
use thornmere_protocol::{ClientMessage, GeCreateOfferPacket, OfferKind};

use crate::tests::{spawn_test_character, test_world};

#[test]
fn buy_offer_matches_resting_sell_offer_and_delivers_the_item() {
    let mut world = test_world();
    let seller = spawn_test_character(&mut world, Vec3::new(0.0, 0.0, 0.0));
    let buyer = spawn_test_character(&mut world, Vec3::new(0.0, 0.0, 0.0));

    world
        .characters
        .get_mut(&seller)
        .unwrap()
        .inventory
        .add(thornmere_server::ids::ItemId(1), 1, false, 1)
        .unwrap();
    world.characters.get_mut(&buyer).unwrap().gold = 1000;

    let sell = serde_json::to_vec(&ClientMessage::GeCreateOffer(GeCreateOfferPacket {
        kind: OfferKind::Sell,
        item_id: 1,
        quantity: 1,
        price_per_unit: 100,
    }))
    .unwrap();
    thornmere_server::router::dispatch(&mut world, seller, &sell).unwrap();

    let buy = serde_json::to_vec(&ClientMessage::GeCreateOffer(GeCreateOfferPacket {
        kind: OfferKind::Buy,
        item_id: 1,
        quantity: 1,
        price_per_unit: 150,
    }))
    .unwrap();
    thornmere_server::router::dispatch(&mut world, buyer, &buy).unwrap();

    // The buyer's gold is escrowed at their own offer price (150/unit) up
    // front; the trade settling at the cheaper resting price (100/unit)
    // leaves the 50gp difference refundable on cancel/collect rather than
    // deducted twice.
    assert_eq!(world.characters.get(&buyer).unwrap().gold, 850);
    assert_eq!(world.characters.get(&seller).unwrap().gold, 100);
    assert_eq!(
        world
            .characters
            .get(&buyer)
            .unwrap()
            .inventory
            .total_quantity(thornmere_server::ids::ItemId(1)),
        1
    );
}
