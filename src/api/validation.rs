use super::ApiError;

pub fn validate_id(kind: &str, id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid {} ID: {}. ID must be a positive integer",
            kind, id
        )));
    }
    Ok(id)
}

pub fn validate_username(name: &str) -> Result<&str, ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }

    if name.len() > 30 {
        return Err(ApiError::validation(
            "Username must be 30 characters or less",
        ));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    {
        return Err(ApiError::validation(
            "Username can only contain letters, numbers, underscores, and periods",
        ));
    }

    Ok(name)
}

pub fn validate_email(email: &str) -> Result<&str, ApiError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }

    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(ApiError::validation(format!("Invalid email address: {email}"))),
    }
}
