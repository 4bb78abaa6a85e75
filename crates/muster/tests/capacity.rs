use std::sync::{Arc, Barrier};
use std::thread;

use muster::model::{Event, EventParticipant, Participant};
use muster::service::{
    EventParticipantService, EventService, LocationService, ParticipantService, RegisterError,
};
use muster_db::{Store, WhereClause};

fn store() -> Arc<Store> {
    let db = Store::in_memory().unwrap();
    db.migrate(muster::SCHEMA).unwrap();
    Arc::new(db)
}

fn seeded(db: &Store, capacity: i64, guests: usize) -> (Event, Vec<Participant>) {
    let location = LocationService::new(db)
        .create("Hall", "1 Main St", capacity)
        .unwrap();
    let event = EventService::new(db)
        .create("Expo", "2024-06-01".parse().unwrap(), location.id.unwrap())
        .unwrap();
    let participants = (0..guests)
        .map(|n| {
            ParticipantService::new(db)
                .create(&format!("Guest {n}"), &format!("guest{n}@example.com"))
                .unwrap()
        })
        .collect();
    (event, participants)
}

#[test]
fn concurrent_registrations_never_oversell() {
    let db = store();
    let (event, participants) = seeded(&db, 2, 4);

    let barrier = Arc::new(Barrier::new(participants.len()));
    let mut handles = Vec::new();
    for participant in participants {
        let db = db.clone();
        let event = event.clone();
        let barrier = barrier.clone();
        handles.push(thread::spawn(move || {
            barrier.wait();
            EventParticipantService::new(&db)
                .register(&event, &participant)
                .map(|_| ())
        }));
    }

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let admitted = results.iter().filter(|r| r.is_ok()).count();
    let refused = results
        .iter()
        .filter(|r| matches!(r, Err(RegisterError::CapacityFull)))
        .count();

    // Capacity two keeps the final seat back, so exactly one gets in.
    assert_eq!(admitted, 1);
    assert_eq!(refused, results.len() - 1);
    assert_eq!(
        db.count::<EventParticipant>(&WhereClause::empty()).unwrap(),
        1
    );
}

#[test]
fn a_bigger_room_admits_up_to_one_below_capacity() {
    let db = store();
    let (event, participants) = seeded(&db, 11, 15);

    let barrier = Arc::new(Barrier::new(participants.len()));
    let mut handles = Vec::new();
    for participant in participants {
        let db = db.clone();
        let event = event.clone();
        let barrier = barrier.clone();
        handles.push(thread::spawn(move || {
            barrier.wait();
            EventParticipantService::new(&db)
                .register(&event, &participant)
                .is_ok()
        }));
    }

    let admitted = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();
    assert_eq!(admitted, 10);
    assert_eq!(
        db.count::<EventParticipant>(&WhereClause::empty()).unwrap(),
        10
    );
}

#[test]
fn the_same_participant_wins_only_one_seat() {
    let db = store();
    let (event, mut participants) = seeded(&db, 100, 1);
    let participant = participants.pop().unwrap();

    let barrier = Arc::new(Barrier::new(2));
    let mut handles = Vec::new();
    for _ in 0..2 {
        let db = db.clone();
        let event = event.clone();
        let participant = participant.clone();
        let barrier = barrier.clone();
        handles.push(thread::spawn(move || {
            barrier.wait();
            EventParticipantService::new(&db)
                .register(&event, &participant)
                .map(|_| ())
        }));
    }

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let admitted = results.iter().filter(|r| r.is_ok()).count();
    let duplicates = results
        .iter()
        .filter(|r| matches!(r, Err(RegisterError::AlreadyRegistered)))
        .count();
    assert_eq!(admitted, 1);
    assert_eq!(duplicates, 1);
    assert_eq!(
        db.count::<EventParticipant>(&WhereClause::empty()).unwrap(),
        1
    );
}
