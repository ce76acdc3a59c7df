pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{MarketError, MarketResult};
pub use types::{Advertiser, CampaignParties, Caller, NegotiationParticipant, Producer, Role};
