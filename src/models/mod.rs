mod credential;
mod customer;
mod oauth_state;
mod purchase;
mod sale;
mod service;

pub use credential::*;
pub use customer::*;
pub use oauth_state::*;
pub use purchase::*;
pub use sale::*;
pub use service::*;
