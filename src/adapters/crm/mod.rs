//! CRM API adapters: the real HTTP gateway, its row mapper, and a mock for
//! tests and serverless demo runs.

pub mod client;
pub(crate) mod mapper;
pub mod mock_gateway;

pub use client::FrappeCrmGateway;
pub use mock_gateway::MockCrmGateway;
