pub mod arrow_value;
pub mod category;
pub mod championship;
pub mod competition;
pub mod end;
pub mod member;
pub mod round;
pub mod scored_session;
pub mod session;
pub mod session_audit;
pub mod session_status;

pub use arrow_value::{ARROWS_PER_END, ArrowValue, DEFAULT_TOKEN, score_of, total_of, x_count_of};
pub use category::{Category, category_for};
pub use championship::{Championship, ChampionshipRound};
pub use competition::{Competition, CompetitionEntry};
pub use end::{Arrow, RecordedEnd};
pub use member::Member;
pub use round::{Round, RoundRange};
pub use scored_session::{ScoredSession, ScoredSessionFilter};
pub use session::{NewSession, Session};
pub use session_audit::{NewSessionAudit, SessionAudit};
pub use session_status::{SessionStatus, TransitionCheck};
