use crate::{
    api::{contractor, earnings, timeclock},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter.clone())
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
             // authentication
            .wrap(protected_limiter) // rate limiting
            .service(handlers::protected)
            .service(
                web::scope("/contractors")
                    // /contractors
                    .service(
                        web::resource("")
                            .route(web::post().to(contractor::create_contractor))
                            .route(web::get().to(contractor::list_contractors)),
                    )
                    // /contractors/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(contractor::update_contractor))
                            .route(web::get().to(contractor::get_contractor))
                            .route(web::delete().to(contractor::delete_contractor)),
                    ),
            )
            .service(
                web::scope("/timeclock")
                    // /timeclock/clock-in
                    .service(
                        web::resource("/clock-in").route(web::post().to(timeclock::clock_in)),
                    )
                    // /timeclock/clock-out
                    .service(
                        web::resource("/clock-out").route(web::post().to(timeclock::clock_out)),
                    )
                    // /timeclock/sessions
                    .service(
                        web::resource("/sessions").route(web::get().to(timeclock::list_sessions)),
                    ),
            )
            .service(
                web::scope("/earnings")
                    // /earnings/weekly
                    .service(
                        web::resource("/weekly").route(web::get().to(earnings::weekly_earnings)),
                    ),
            ),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)
//
// API REQUEST
//  └─ Authorization: Bearer access_token
//
// ACCESS EXPIRED
//  └─ POST /refresh with refresh_token
//       └─ returns new access_token
