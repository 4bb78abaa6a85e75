use chrono::NaiveDate;
use muster_db::{Store, DATE_FORMAT};
use serde::Serialize;

use crate::model::{Event, EventParticipant, Ip, Location, Participant};

/// Which relations an [`EventResource`] carries; everything defaults to off
/// and absent relations are dropped from the JSON entirely.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventInclude {
    pub location: bool,
    pub participants: bool,
    pub visitors: bool,
}

#[derive(Debug, Serialize)]
pub struct EventResource {
    pub id: Option<i64>,
    pub name: String,
    pub date: String,
    pub location_id: i64,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationResource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participants: Option<Vec<ParticipantResource>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visitors: Option<u64>,
}

impl EventResource {
    /// The event's own columns with no relations attached.
    pub fn bare(event: &Event) -> EventResource {
        EventResource {
            id: event.id,
            name: event.name.clone(),
            date: day(event.date),
            location_id: event.location_id,
            created_at: day(event.created_at.date()),
            location: None,
            participants: None,
            visitors: None,
        }
    }

    /// Loads and attaches the requested relations.
    pub fn render(
        db: &Store,
        event: &mut Event,
        include: EventInclude,
    ) -> muster_db::Result<EventResource> {
        let mut resource = EventResource::bare(event);
        if include.location {
            resource.location = event.location(db)?.map(LocationResource::from);
        }
        if include.participants {
            let participants = event
                .participants(db)?
                .iter()
                .map(ParticipantResource::from)
                .collect();
            resource.participants = Some(participants);
        }
        if include.visitors {
            resource.visitors = Some(event.registration_count(db)?);
        }
        Ok(resource)
    }
}

#[derive(Debug, Serialize)]
pub struct EventParticipantResource {
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<EventResource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant: Option<ParticipantResource>,
    pub registered_at: String,
}

impl EventParticipantResource {
    /// Attaches both ends of the registration; the nested event carries no
    /// relations of its own.
    pub fn render(
        db: &Store,
        registration: &mut EventParticipant,
    ) -> muster_db::Result<EventParticipantResource> {
        let event = registration.event(db)?.map(EventResource::bare);
        let participant = registration.participant(db)?.map(ParticipantResource::from);
        Ok(EventParticipantResource {
            id: registration.id,
            event,
            participant,
            registered_at: day(registration.created_at.date()),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct LocationResource {
    pub id: Option<i64>,
    pub name: String,
    pub address: String,
    pub capacity: i64,
    pub created_at: String,
}

impl From<&Location> for LocationResource {
    fn from(location: &Location) -> LocationResource {
        LocationResource {
            id: location.id,
            name: location.name.clone(),
            address: location.address.clone(),
            capacity: location.capacity,
            created_at: day(location.created_at.date()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ParticipantResource {
    pub id: Option<i64>,
    pub name: String,
    pub email: String,
    pub created_at: String,
}

impl From<&Participant> for ParticipantResource {
    fn from(participant: &Participant) -> ParticipantResource {
        ParticipantResource {
            id: participant.id,
            name: participant.name.clone(),
            email: participant.email.clone(),
            created_at: day(participant.created_at.date()),
        }
    }
}

/// Carries either `blacklisted_at` or `whitelisted_at` depending on which
/// list the address is on; both are the creation date.
#[derive(Debug, Serialize)]
pub struct IpResource {
    pub id: Option<i64>,
    pub ip_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blacklisted_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whitelisted_at: Option<String>,
}

impl From<&Ip> for IpResource {
    fn from(ip: &Ip) -> IpResource {
        let stamp = day(ip.created_at.date());
        IpResource {
            id: ip.id,
            ip_address: ip.ip_address.clone(),
            blacklisted_at: ip.is_blacklisted().then(|| stamp.clone()),
            whitelisted_at: ip.is_whitelisted().then_some(stamp),
        }
    }
}

fn day(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
