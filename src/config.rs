use std::env;
use std::str::FromStr;

use chrono::NaiveTime;
use dotenvy::dotenv;

use crate::payroll::rules::{HoursSource, PayrollRules, WeekPolicy};

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_register_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    /// Earnings-engine tunables, overridable via PAYROLL_* variables.
    pub payroll: PayrollRules,
}

fn env_f64(key: &str, default: f64) -> f64 {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .unwrap()
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            access_token_ttl: env::var("ACCESS_TOKEN_TTL")
                .unwrap_or_else(|_| "900".to_string()) // default 15 min
                .parse()
                .unwrap(),
            refresh_token_ttl: env::var("REFRESH_TOKEN_TTL")
                .unwrap_or_else(|_| "604800".to_string()) // default 7 days
                .parse()
                .unwrap(),

            rate_login_per_min: env::var("RATE_LOGIN_PER_MIN")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap(),
            rate_register_per_min: env::var("RATE_REGISTER_PER_MIN")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap(),
            rate_refresh_per_min: env::var("RATE_REFRESH_PER_MIN")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap(),
            rate_protected_per_min: env::var("RATE_PROTECTED_PER_MIN")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .unwrap(),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            payroll: payroll_rules_from_env(),
        }
    }
}

fn payroll_rules_from_env() -> PayrollRules {
    let defaults = PayrollRules::default();

    PayrollRules {
        full_day_hours: env_f64("PAYROLL_FULL_DAY_HOURS", defaults.full_day_hours),
        late_cutoff: env::var("PAYROLL_LATE_CUTOFF")
            .ok()
            .map(|s| NaiveTime::parse_from_str(&s, "%H:%M").expect("PAYROLL_LATE_CUTOFF must be HH:MM"))
            .unwrap_or(defaults.late_cutoff),
        late_penalty_per_minute: env_f64(
            "PAYROLL_LATE_PENALTY_PER_MINUTE",
            defaults.late_penalty_per_minute,
        ),
        late_penalty_cap: env_f64("PAYROLL_LATE_PENALTY_CAP", defaults.late_penalty_cap),
        min_daily_pay: env_f64("PAYROLL_MIN_DAILY_PAY", defaults.min_daily_pay),
        cis_registered_rate: env_f64("PAYROLL_CIS_REGISTERED_RATE", defaults.cis_registered_rate),
        cis_unregistered_rate: env_f64(
            "PAYROLL_CIS_UNREGISTERED_RATE",
            defaults.cis_unregistered_rate,
        ),
        week_policy: env::var("PAYROLL_WEEK_POLICY")
            .ok()
            .map(|s| WeekPolicy::from_str(&s).expect("PAYROLL_WEEK_POLICY must be monday_to_sunday or ending_friday"))
            .unwrap_or(defaults.week_policy),
        hours_source: env::var("PAYROLL_HOURS_SOURCE")
            .ok()
            .map(|s| HoursSource::from_str(&s).expect("PAYROLL_HOURS_SOURCE must be recorded_then_delta or delta_only"))
            .unwrap_or(defaults.hours_source),
        recorded_hours_tolerance: env_f64(
            "PAYROLL_RECORDED_HOURS_TOLERANCE",
            defaults.recorded_hours_tolerance,
        ),
    }
}
