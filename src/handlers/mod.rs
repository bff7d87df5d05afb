//! HTTP handlers. Each one parses the request, calls a service and shapes
//! the response; all rules live in the services.

pub mod file_handlers;
pub mod folder_handlers;
pub mod health_handlers;
pub mod share_handlers;
