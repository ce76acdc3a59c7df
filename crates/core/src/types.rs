//! Party types for the two sides of a negotiated placement.
//!
//! Producers own catalog entries (podcasts), advertisers own brand profiles.
//! Role is carried by the type, so a producer-only operation takes a
//! [`Producer`] and can never be handed an advertiser.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Producer,
    Advertiser,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Producer => f.write_str("producer"),
            Role::Advertiser => f.write_str("advertiser"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "producer" | "podcast_host" => Ok(Role::Producer),
            "advertiser" | "brand" => Ok(Role::Advertiser),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// The owners of both sides of one campaign, resolved from the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CampaignParties {
    /// Owner of the campaign's catalog entry.
    pub producer: Uuid,
    /// Owner of the campaign's brand.
    pub advertiser: Uuid,
}

/// Common interface of anyone who can take part in a negotiation.
pub trait NegotiationParticipant {
    fn user_id(&self) -> Uuid;

    fn role(&self) -> Role;

    /// Whether this participant owns the side of `parties` matching its role.
    fn owns(&self, parties: &CampaignParties) -> bool {
        match self.role() {
            Role::Producer => parties.producer == self.user_id(),
            Role::Advertiser => parties.advertiser == self.user_id(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Producer(pub Uuid);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Advertiser(pub Uuid);

impl NegotiationParticipant for Producer {
    fn user_id(&self) -> Uuid {
        self.0
    }

    fn role(&self) -> Role {
        Role::Producer
    }
}

impl NegotiationParticipant for Advertiser {
    fn user_id(&self) -> Uuid {
        self.0
    }

    fn role(&self) -> Role {
        Role::Advertiser
    }
}

/// An authenticated caller of either role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller {
    Producer(Producer),
    Advertiser(Advertiser),
}

impl Caller {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        match role {
            Role::Producer => Caller::Producer(Producer(user_id)),
            Role::Advertiser => Caller::Advertiser(Advertiser(user_id)),
        }
    }

    pub fn as_producer(&self) -> Option<&Producer> {
        match self {
            Caller::Producer(p) => Some(p),
            Caller::Advertiser(_) => None,
        }
    }

    pub fn as_advertiser(&self) -> Option<&Advertiser> {
        match self {
            Caller::Advertiser(a) => Some(a),
            Caller::Producer(_) => None,
        }
    }
}

impl NegotiationParticipant for Caller {
    fn user_id(&self) -> Uuid {
        match self {
            Caller::Producer(p) => p.user_id(),
            Caller::Advertiser(a) => a.user_id(),
        }
    }

    fn role(&self) -> Role {
        match self {
            Caller::Producer(_) => Role::Producer,
            Caller::Advertiser(_) => Role::Advertiser,
        }
    }
}

impl From<Producer> for Caller {
    fn from(p: Producer) -> Self {
        Caller::Producer(p)
    }
}

impl From<Advertiser> for Caller {
    fn from(a: Advertiser) -> Self {
        Caller::Advertiser(a)
    }
}
