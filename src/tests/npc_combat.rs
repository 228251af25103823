use thornmere_math::Vec3;
use thornmere_protocol::{AttackPacket, ClientMessage, ServerMessage};

use crate::tests::{spawn_test_character, test_world};

#[test]
fn repeated_attacks_eventually_kill_the_target_npc() {
    let mut world = test_world();
    let character = spawn_test_character(&mut world, Vec3::new(0.0, 0.0, 0.0));
    let template = world.catalog.npc_template(thornmere_server::ids::NpcTemplateId(1)).unwrap().clone();
    let npc_id = world.npcs.spawn(thornmere_server::ids::ZoneId(1), Vec3::new(1.0, 0.0, 0.0), &template);

    let mut saw_death = false;
    for tick in 0..10u64 {
        world.current_tick = tick;
        let packet = serde_json::to_vec(&ClientMessage::Attack(AttackPacket {
            target_npc_id: Some(npc_id.0),
            target_character_id: None,
            ability_id: None,
        }))
        .unwrap();
        let responses = thornmere_server::router::dispatch(&mut world, character, &packet);
        let Ok(responses) = responses else { continue };
        if responses
            .iter()
            .any(|r| matches!(r, ServerMessage::NpcState { state, .. } if state == "dead"))
        {
            saw_death = true;
            break;
        }
    }

    assert!(saw_death);
}
