#![allow(clippy::print_stdout, clippy::unwrap_used, clippy::expect_used)]

//! Guarded Server Example
//!
//! A small actix-web server protected by the session-hijack guard. Every
//! request carrying a `session_id` cookie is fingerprinted; if the
//! fingerprint ever changes for the same session, the session is destroyed
//! and the client is redirected to `/login`.
//!
//! Run with: `cargo run --example guarded_server --features actix`
//!
//! Try it:
//!   curl -v http://localhost:8080/account \
//!     -H 'Cookie: session_id=demo-token' \
//!     -H 'User-Agent: BrowserA' -H 'X-Forwarded-For: 1.2.3.4'
//!
//!   # same token, different client profile -> 302 to /login
//!   curl -v http://localhost:8080/account \
//!     -H 'Cookie: session_id=demo-token' \
//!     -H 'User-Agent: BrowserB' -H 'X-Forwarded-For: 1.2.3.4'

use std::sync::Arc;

use actix_web::{App, HttpResponse, HttpServer, web};
use vigil::api::actix::Shield;
use vigil::{GuardConfig, InMemorySessionStore, SessionGuard, StaticGeoResolver};

async fn account() -> HttpResponse {
    HttpResponse::Ok().body("account page: your session fingerprint is intact\n")
}

async fn login() -> HttpResponse {
    HttpResponse::Ok().body("login page: your previous session was terminated\n")
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // In production, swap the static table for MaxMindGeoResolver
    // (feature `maxmind`) backed by a GeoLite2 country database.
    let geo = StaticGeoResolver::new()
        .with_entry("1.2.3.4", "US")
        .with_entry("5.6.7.8", "DE");

    let config = GuardConfig {
        redirect_to: "/login".to_owned(),
        ..Default::default()
    };

    let guard = Arc::new(SessionGuard::new(config, Arc::new(geo)));
    let store = Arc::new(InMemorySessionStore::new());

    println!("Guarded server listening on http://localhost:8080");

    HttpServer::new(move || {
        App::new()
            .route("/login", web::get().to(login))
            .service(
                web::scope("")
                    .wrap(Shield::new(
                        Arc::clone(&guard),
                        Arc::clone(&store),
                        "session_id",
                    ))
                    .route("/account", web::get().to(account)),
            )
    })
    .bind(("127.0.0.1", 8080))?
    .run()
    .await
}
