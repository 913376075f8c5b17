//! End-to-end board lifecycle against both storage backends.
//!
//! Drives the service through create → advance → lookup → converge → delete
//! and checks the generation log invariants after every phase.

use life::core::grid::decode;
use life::error::NotFoundError;
use life::io::store::Store;
use life::service::{BoardService, FinalState};
use life::test_support::{ALL_ALIVE, BLINKER, PLUS, file_service, memory_service};

fn exercise<S: Store>(service: &BoardService<S>) {
    let id = service.create(PLUS, 3, 3).expect("create");

    // Generation 0 decodes to the caller's input.
    let initial = service.initial_state(id).expect("initial");
    assert_eq!(
        decode(&initial).expect("decode"),
        decode(PLUS).expect("decode")
    );

    assert_eq!(service.advance_and_get(id).expect("advance"), "111\n101\n111");
    assert_eq!(service.advance_and_get(id).expect("advance"), "101\n000\n101");
    assert_eq!(service.summary(id).expect("summary").generations, 3);

    let err = service.state_at_step(id, 3).expect_err("not materialized");
    assert!(matches!(
        err.downcast_ref::<NotFoundError>(),
        Some(NotFoundError::Step { step: 3, .. })
    ));

    assert_eq!(
        service.final_state(id, Some(10)).expect("final"),
        FinalState::Stable {
            state: "000\n000\n000".to_string(),
            step: 4,
        }
    );
    assert_eq!(service.state_at_step(id, 3).expect("step 3"), "000\n000\n000");
    assert!(service.verify(id).expect("verify").is_empty());

    let blinker = service.create(BLINKER, 3, 3).expect("create");
    assert!(matches!(
        service.final_state(blinker, Some(7)).expect("final"),
        FinalState::Unstable { advances: 7, .. }
    ));
    assert!(service.verify(blinker).expect("verify").is_empty());

    let corners = service.create(ALL_ALIVE, 3, 3).expect("create");
    assert_eq!(service.advance_and_get(corners).expect("advance"), "101\n000\n101");

    assert_eq!(
        service.board_ids().expect("ids"),
        vec![id, blinker, corners]
    );
    assert!(service.delete(id).expect("delete"));
    assert_eq!(service.store().count_generations(id).expect("count"), 0);
    assert_eq!(service.board_ids().expect("ids"), vec![blinker, corners]);
}

#[test]
fn lifecycle_in_memory() {
    exercise(&memory_service());
}

#[test]
fn lifecycle_on_disk() {
    let (_temp, service) = file_service();
    exercise(&service);
}

#[test]
fn file_backed_boards_survive_reopen() {
    let (temp, service) = file_service();
    let id = service.create(BLINKER, 3, 3).expect("create");
    service.advance_and_get(id).expect("advance");
    drop(service);

    let store = life::io::file_store::FileStore::open(temp.path().join("data")).expect("reopen");
    let service = BoardService::new(store, Default::default());
    assert_eq!(service.state_at_step(id, 1).expect("step 1"), "010\n010\n010");
    assert_eq!(service.advance_and_get(id).expect("advance"), BLINKER);
    assert!(service.verify(id).expect("verify").is_empty());
}
