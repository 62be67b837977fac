mod restore;
mod score;

pub use restore::cmd_restore_reputation;
pub use score::cmd_score_text;
