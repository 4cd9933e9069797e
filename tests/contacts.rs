use bevy::prelude::*;
use bevy_autodrive::AutodriveContacts;

#[test]
fn contacts_start_and_end_once() {
    let vehicle = Entity::from_raw(1);
    let wall = Entity::from_raw(2);
    let floor = Entity::from_raw(3);
    let mut contacts = AutodriveContacts::default();

    assert!(contacts.start_contact(vehicle, wall, true));
    assert!(!contacts.start_contact(vehicle, wall, true));
    assert!(contacts.start_contact(vehicle, floor, false));
    assert_eq!(contacts.touching.len(), 2);

    assert!(contacts.end_contact(vehicle, wall, true));
    assert!(!contacts.end_contact(vehicle, wall, true));
    assert!(contacts.touching.contains(&floor));
    assert!(!contacts.touching.contains(&wall));
}

#[test]
fn obstacle_contact_follows_the_touching_set() {
    let vehicle = Entity::from_raw(1);
    let wall = Entity::from_raw(2);
    let floor = Entity::from_raw(3);
    let is_obstacle = |entity: Entity| entity == wall;
    let mut contacts = AutodriveContacts::default();
    assert!(!contacts.any_obstacle(is_obstacle));

    contacts.start_contact(vehicle, floor, false);
    assert!(!contacts.any_obstacle(is_obstacle));

    contacts.start_contact(vehicle, wall, true);
    assert!(contacts.any_obstacle(is_obstacle));
    // Only the backend writes the flag.
    assert!(!contacts.touching_obstacle);

    contacts.end_contact(vehicle, wall, true);
    assert!(!contacts.any_obstacle(is_obstacle));
}
