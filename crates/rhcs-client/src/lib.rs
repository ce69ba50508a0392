//! RHCS-Client: Clusters-Management API Access for the RHCS Provider
//!
//! This crate describes everything the provider core needs from the remote
//! clusters-management API, and nothing about how the core uses it.
//!
//! ## Layer 0 - Remote API
//!
//! Focus: Faithful remote object model and swappable transports.
//!
//! ## Key Components
//!
//! - `ClusterClient`, `IngressClient`, `GroupMembershipClient`: async client traits
//! - `Cluster`, `Ingress`, `User`: remote object model
//! - `HttpClustersApi`: REST implementation
//! - `fakes::MemoryClustersApi`: in-memory implementation for tests

pub mod client_traits;
mod error;
pub mod fakes;
mod http;
pub mod model;

pub use client_traits::{
    ApiResult, ClusterClient, ClustersApi, GroupMembershipClient, IngressClient,
};
pub use error::ApiError;
pub use http::HttpClustersApi;
pub use model::{Cluster, ClusterState, ClusterVersion, Ingress, ListPage, User};
