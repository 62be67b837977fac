use crate::config::Config;
use crate::db::Store;
use crate::moderation::ReputationPolicy;

pub async fn cmd_restore_reputation(config: &Config, username: &str) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let policy = ReputationPolicy::from_config(&config.moderation);

    let Some(before) = store.get_user_by_username(username).await? else {
        println!("User '{username}' not found.");
        return Ok(());
    };

    let Some(user) = store.set_user_reputation(username, policy.initial).await? else {
        println!("User '{username}' not found.");
        return Ok(());
    };

    tracing::info!(
        user_id = user.id,
        old_score = before.reputation_score,
        new_score = user.reputation_score,
        "Reputation restored by operator"
    );

    println!(
        "✓ Restored {}: {:.2} -> {:.2} ({:?})",
        user.username,
        before.reputation_score,
        user.reputation_score,
        policy.state(user.reputation_score)
    );

    Ok(())
}
