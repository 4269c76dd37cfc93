use super::parsing::{
    env_optional, env_or_default, parse_bool, parse_cors_origins, parse_environment, parse_u16,
    parse_u64, trim_trailing_slash,
};
use super::secret::load_or_create_secret_key;
use super::types::{
    AdminSettings, ApiSettings, ConfigError, CorsSettings, DatabaseSettings, EmailSettings,
    JitsiSettings, RazorpaySettings, RedisSettings, RuntimeSettings, S3Settings,
    SecuritySettings, ServerHost, ServerPort, ServerSettings, Settings, StorageSettings,
    TelemetrySettings,
};

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let host = env_or_default("KODETO_HOST", "0.0.0.0");
        let port = env_or_default("KODETO_PORT", "8000");

        let environment =
            parse_environment(env_optional("KODETO_ENV").or_else(|| env_optional("ENVIRONMENT")));
        let strict_config =
            env_optional("KODETO_STRICT_CONFIG").map(|value| parse_bool(&value)).unwrap_or(false)
                || environment.is_production();

        let project_name = env_or_default("PROJECT_NAME", "Kodeto LMS API");
        let api_v1_str = env_or_default("API_V1_STR", "/api/v1");
        let frontend_url =
            trim_trailing_slash(env_or_default("FRONTEND_URL", "http://localhost:3000"));

        let secret_key = match env_optional("SECRET_KEY") {
            Some(value) => value,
            None => load_or_create_secret_key(),
        };
        let access_token_expire_minutes = parse_u64(
            "ACCESS_TOKEN_EXPIRE_MINUTES",
            env_or_default("ACCESS_TOKEN_EXPIRE_MINUTES", "1440"),
        )?;
        let algorithm = env_or_default("ALGORITHM", "HS256");

        let cors_origins = parse_cors_origins(env_optional("BACKEND_CORS_ORIGINS"))?;

        let postgres_server = env_or_default("POSTGRES_SERVER", "localhost");
        let postgres_port = parse_u16("POSTGRES_PORT", env_or_default("POSTGRES_PORT", "5432"))?;
        let postgres_user = env_or_default("POSTGRES_USER", "kodeto");
        let postgres_password = env_or_default("POSTGRES_PASSWORD", "");
        let postgres_db = env_or_default("POSTGRES_DB", "kodeto_lms");
        let database_url = env_optional("DATABASE_URL");

        let redis_host = env_or_default("REDIS_HOST", "localhost");
        let redis_port = parse_u16("REDIS_PORT", env_or_default("REDIS_PORT", "6379"))?;
        let redis_db = parse_u16("REDIS_DB", env_or_default("REDIS_DB", "0"))?;
        let redis_password = env_or_default("REDIS_PASSWORD", "");

        let max_video_size_mb =
            parse_u64("MAX_VIDEO_SIZE_MB", env_or_default("MAX_VIDEO_SIZE_MB", "100"))?;
        let max_note_size_mb =
            parse_u64("MAX_NOTE_SIZE_MB", env_or_default("MAX_NOTE_SIZE_MB", "10"))?;
        let presigned_url_expire_minutes = parse_u64(
            "PRESIGNED_URL_EXPIRE_MINUTES",
            env_or_default("PRESIGNED_URL_EXPIRE_MINUTES", "60"),
        )?;

        let s3_endpoint = env_or_default("S3_ENDPOINT", "https://s3.amazonaws.com");
        let s3_access_key = env_or_default("S3_ACCESS_KEY", "");
        let s3_secret_key = env_or_default("S3_SECRET_KEY", "");
        let s3_bucket = env_or_default("S3_BUCKET", "kodeto-media");
        let s3_region = env_or_default("S3_REGION", "ap-south-1");

        let first_superuser_email =
            env_or_default("FIRST_SUPERUSER_EMAIL", "admin@kodetocareer.com");
        let first_superuser_password = env_or_default("FIRST_SUPERUSER_PASSWORD", "");

        let log_level = env_or_default("KODETO_LOG_LEVEL", "info");
        let json = env_optional("KODETO_LOG_JSON").map(|value| parse_bool(&value)).unwrap_or(false);
        let prometheus_enabled =
            env_optional("PROMETHEUS_ENABLED").map(|value| parse_bool(&value)).unwrap_or(false);

        let jitsi_domain = trim_trailing_slash(env_or_default("JITSI_DOMAIN", "meet.jit.si"));
        let jitsi_app_id = env_or_default("JITSI_APP_ID", "");
        let jitsi_app_secret = env_or_default("JITSI_APP_SECRET", "");

        let razorpay_key_id = env_or_default("RAZORPAY_KEY_ID", "");
        let razorpay_key_secret = env_or_default("RAZORPAY_KEY_SECRET", "");
        let razorpay_webhook_secret = env_or_default("RAZORPAY_WEBHOOK_SECRET", "");
        let razorpay_base_url =
            trim_trailing_slash(env_or_default("RAZORPAY_BASE_URL", "https://api.razorpay.com/v1"));
        let razorpay_timeout_seconds = parse_u64(
            "RAZORPAY_TIMEOUT_SECONDS",
            env_or_default("RAZORPAY_TIMEOUT_SECONDS", "15"),
        )?;

        let email_enabled =
            env_optional("EMAIL_ENABLED").map(|value| parse_bool(&value)).unwrap_or(false);
        let smtp_host = env_or_default("SMTP_HOST", "");
        let smtp_port = parse_u16("SMTP_PORT", env_or_default("SMTP_PORT", "587"))?;
        let smtp_username = env_or_default("SMTP_USERNAME", "");
        let smtp_password = env_or_default("SMTP_PASSWORD", "");
        let smtp_tls = env_optional("SMTP_TLS").map(|value| parse_bool(&value)).unwrap_or(true);
        let smtp_from = env_or_default("SMTP_FROM", "Kodeto Career <no-reply@kodetocareer.com>");

        let settings = Self {
            server: ServerSettings {
                host: ServerHost::parse(host)?,
                port: ServerPort::parse(port)?,
            },
            runtime: RuntimeSettings { environment, strict_config },
            api: ApiSettings { project_name, api_v1_str, frontend_url },
            security: SecuritySettings { secret_key, access_token_expire_minutes, algorithm },
            cors: CorsSettings { origins: cors_origins },
            database: DatabaseSettings {
                postgres_server,
                postgres_port,
                postgres_user,
                postgres_password,
                postgres_db,
                database_url,
            },
            redis: RedisSettings {
                host: redis_host,
                port: redis_port,
                db: redis_db,
                password: redis_password,
            },
            storage: StorageSettings {
                max_video_size_mb,
                max_note_size_mb,
                presigned_url_expire_minutes,
            },
            s3: S3Settings {
                endpoint: s3_endpoint,
                access_key: s3_access_key,
                secret_key: s3_secret_key,
                bucket: s3_bucket,
                region: s3_region,
            },
            admin: AdminSettings { first_superuser_email, first_superuser_password },
            telemetry: TelemetrySettings { log_level, json, prometheus_enabled },
            jitsi: JitsiSettings {
                domain: jitsi_domain,
                app_id: jitsi_app_id,
                app_secret: jitsi_app_secret,
            },
            razorpay: RazorpaySettings {
                key_id: razorpay_key_id,
                key_secret: razorpay_key_secret,
                webhook_secret: razorpay_webhook_secret,
                base_url: razorpay_base_url,
                timeout_seconds: razorpay_timeout_seconds,
            },
            email: EmailSettings {
                enabled: email_enabled,
                smtp_host,
                smtp_port,
                smtp_username,
                smtp_password,
                smtp_tls,
                from_address: smtp_from,
            },
        };

        settings.validate()?;
        Ok(settings)
    }

    pub(crate) fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host.0, self.server.port.0)
    }

    pub(crate) fn server_host(&self) -> &str {
        &self.server.host.0
    }

    pub(crate) fn server_port(&self) -> u16 {
        self.server.port.0
    }

    pub(crate) fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub(crate) fn security(&self) -> &SecuritySettings {
        &self.security
    }

    pub(crate) fn cors(&self) -> &CorsSettings {
        &self.cors
    }

    pub(crate) fn database(&self) -> &DatabaseSettings {
        &self.database
    }

    pub(crate) fn redis(&self) -> &RedisSettings {
        &self.redis
    }

    pub(crate) fn storage(&self) -> &StorageSettings {
        &self.storage
    }

    pub(crate) fn s3(&self) -> &S3Settings {
        &self.s3
    }

    pub(crate) fn admin(&self) -> &AdminSettings {
        &self.admin
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn jitsi(&self) -> &JitsiSettings {
        &self.jitsi
    }

    pub(crate) fn razorpay(&self) -> &RazorpaySettings {
        &self.razorpay
    }

    pub(crate) fn email(&self) -> &EmailSettings {
        &self.email
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.max_video_size_mb == 0 {
            return Err(ConfigError::InvalidValue {
                field: "MAX_VIDEO_SIZE_MB",
                value: "0".to_string(),
            });
        }

        if self.storage.max_note_size_mb == 0 {
            return Err(ConfigError::InvalidValue {
                field: "MAX_NOTE_SIZE_MB",
                value: "0".to_string(),
            });
        }

        if self.jitsi.domain.is_empty() || self.jitsi.domain.contains("://") {
            return Err(ConfigError::InvalidValue {
                field: "JITSI_DOMAIN",
                value: self.jitsi.domain.clone(),
            });
        }

        if !(self.runtime.strict_config || self.runtime.environment.is_production()) {
            return Ok(());
        }

        if self.database.database_url.is_none() && self.database.postgres_password.is_empty() {
            return Err(ConfigError::MissingSecret("POSTGRES_PASSWORD"));
        }
        if self.s3.access_key.is_empty() || self.s3.secret_key.is_empty() {
            return Err(ConfigError::MissingSecret("S3_ACCESS_KEY/S3_SECRET_KEY"));
        }
        if self.admin.first_superuser_password.is_empty() {
            return Err(ConfigError::MissingSecret("FIRST_SUPERUSER_PASSWORD"));
        }
        if !self.razorpay.is_configured() {
            return Err(ConfigError::MissingSecret("RAZORPAY_KEY_ID/RAZORPAY_KEY_SECRET"));
        }
        if self.email.enabled
            && (self.email.smtp_host.is_empty() || self.email.smtp_password.is_empty())
        {
            return Err(ConfigError::MissingSecret("SMTP_HOST/SMTP_PASSWORD"));
        }

        Ok(())
    }
}
