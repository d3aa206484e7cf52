//! # scorecard-chat
//!
//! Client for building a hiring scorecard by conversing with a remote AI
//! assistant. A conversation is started fresh or resumed from an HTTP-loaded
//! history, then extended one WebSocket exchange at a time while the backend
//! fills in the seven scorecard sections.
//!
//! ```rust,ignore
//! let transport = BackendTransport::new(ClientConfig::load(None)?);
//! let mut controller = SessionController::new(transport);
//! controller.create(CreateForm::new("Senior Engineer")).await?;
//! controller.send("I lead a team of 5").await?;
//! println!("{}", render::render_scorecard(controller.session().unwrap()));
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod protocol;
pub mod reconcile;
pub mod render;
pub mod scorecard;
pub mod session;
pub mod store;
pub mod transport;

pub use config::ClientConfig;
pub use error::{ConfigError, Error, Result, SessionError, TransportError};
pub use protocol::{History, InboundEvent, Message, OutboundEnvelope, OutboundKind, Role};
pub use reconcile::{reconcile, SessionDelta};
pub use scorecard::{ScorecardDraft, SectionFields, SectionName, SectionUpdate};
pub use session::{CreateForm, Notice, NoticeLevel, SendOutcome, SessionController, UiState};
pub use store::ConversationSession;
pub use transport::{BackendTransport, Transport};
