//! External document question answering
//!
//! [`QaClient`] speaks the wire protocol of the file search service.
//! [`DocumentQaService`] resolves files and collections the caller may read,
//! validates requests and hosts the chat inlet hook.

pub mod client;
pub mod service;

pub use client::{build_documents, AnswerRequest, QaApiResponse, QaClient, QaDocument, SERVICE_NAME};
pub use service::{DocumentQaService, QaRequest, QaResponse};
