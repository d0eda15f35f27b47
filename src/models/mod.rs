// Data models and request/response types

pub mod user;
pub mod geo;
pub mod lookup;
pub mod training;
pub mod participant;
pub mod assessment;
pub mod stock_request;
pub mod notification;
pub mod dashboard;

pub use user::*;
pub use geo::*;
pub use lookup::*;
pub use training::*;
pub use participant::*;
pub use assessment::*;
pub use stock_request::*;
pub use notification::*;
pub use dashboard::*;
