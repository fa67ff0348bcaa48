//! Client side of the folio offline router.
//!
//! This crate provides the network seam, request classification, the four
//! caching strategies and the service-worker lifecycle built on top of them.

pub mod fetch;
pub mod router;

pub use fetch::{FetchConfig, HttpNetwork, Method, Network, Request, RequestMode, Response, ResponseSource, StatusCode};

pub use router::{
    ActivateReport, ClientMessage, FetchOutcome, InstallReport, LifecycleState, MessageReply, Notification,
    NotificationAction, Registration, RouteTable, Router, RouterConfig, SubmitOutcome, SyncReport,
};
