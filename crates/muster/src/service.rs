mod event_participants;
pub use event_participants::{EventParticipantService, RegisterError};

mod events;
pub use events::EventService;

mod ips;
pub use ips::IpService;

mod locations;
pub use locations::LocationService;

mod participants;
pub use participants::ParticipantService;
