// config.rs
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: Option<String>,
    pub app_url: String,
    pub jwt_secret: String,
    pub jwt_maxage: i64,
    pub port: u16,
    // Admin emails that may never self-register
    pub admin_emails: Vec<String>,
    // AI / geo providers
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub google_maps_api_key: String,
    // Image storage
    pub cloudinary_cloud_name: String,
    pub cloudinary_upload_preset: String,
    // Email service configurations
    pub smtp_host: String,
    pub smtp_username: String,
    pub smtp_password: String,
}

impl Config {
    pub fn init() -> Config {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let jwt_secret = std::env::var("JWT_SECRET_KEY").expect("JWT_SECRET_KEY must be set");
        let jwt_maxage = std::env::var("JWT_MAXAGE").expect("JWT_MAXAGE must be set");
        let app_url = std::env::var("APP_URL").expect("APP_URL must be set");

        let redis_url = std::env::var("REDIS_URL").ok();

        let admin_emails = std::env::var("ADMIN_EMAILS")
            .unwrap_or_else(|_| "admin@solarmatch.co.ke".to_string())
            .split(',')
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();

        let gemini_api_key = std::env::var("GEMINI_API_KEY").expect("GEMINI_API_KEY must be set");
        let gemini_model = std::env::var("GEMINI_MODEL")
            .unwrap_or_else(|_| "gemini-1.5-pro-latest".to_string());
        let google_maps_api_key = std::env::var("GOOGLE_MAPS_API_KEY")
            .unwrap_or_else(|_| "".to_string());

        let cloudinary_cloud_name =
            std::env::var("CLOUDINARY_CLOUD_NAME").expect("CLOUDINARY_CLOUD_NAME must be set");
        let cloudinary_upload_preset = std::env::var("CLOUDINARY_UPLOAD_PRESET")
            .unwrap_or_else(|_| "roof_analysis".to_string());

        // Email service configurations (with defaults)
        let smtp_host = std::env::var("SMTP_HOST")
            .unwrap_or_else(|_| "localhost".to_string());
        let smtp_username = std::env::var("SMTP_USERNAME")
            .unwrap_or_else(|_| "".to_string());
        let smtp_password = std::env::var("SMTP_PASSWORD")
            .unwrap_or_else(|_| "".to_string());

        Config {
            database_url,
            redis_url,
            app_url,
            jwt_secret,
            jwt_maxage: jwt_maxage.parse::<i64>().unwrap(),
            port: 8000,
            admin_emails,
            gemini_api_key,
            gemini_model,
            google_maps_api_key,
            cloudinary_cloud_name,
            cloudinary_upload_preset,
            smtp_host,
            smtp_username,
            smtp_password,
        }
    }
}
