use super::sendmail::send_email;

/// Second-factor login code, valid for a few minutes and single use.
pub async fn send_login_code_email(
    to_email: &str,
    username: &str,
    code: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let subject = "Your SolarMatch Login Code";
    let template_path = "src/mail/templates/LoginCode-email.html";
    let placeholders = vec![
        ("{{username}}".to_string(), username.to_string()),
        ("{{login_code}}".to_string(), code.to_string()),
    ];

    send_email(to_email, subject, template_path, &placeholders).await
}

/// Credentials for an admin-created installer account. The temporary
/// password must be changed on first login.
pub async fn send_installer_welcome_email(
    to_email: &str,
    full_name: &str,
    username: &str,
    temp_password: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let subject = "Your SolarMatch Installer Account";
    let template_path = "src/mail/templates/InstallerWelcome-email.html";
    let placeholders = vec![
        ("{{full_name}}".to_string(), full_name.to_string()),
        ("{{username}}".to_string(), username.to_string()),
        ("{{temp_password}}".to_string(), temp_password.to_string()),
    ];

    send_email(to_email, subject, template_path, &placeholders).await
}
