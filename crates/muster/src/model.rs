mod event;
pub use event::Event;

mod event_participant;
pub use event_participant::EventParticipant;

mod ip;
pub use ip::Ip;

mod location;
pub use location::Location;

mod participant;
pub use participant::Participant;
