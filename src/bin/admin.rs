// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Operator tooling: mint signing keys and issue tokens offline.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use authgate_server::auth::{Authenticator, Claims, Role};
use authgate_server::config::{ACTIVE_KID_ENV, KEYS_DIR_ENV, TOKEN_ISSUER_ENV};
use authgate_server::keystore::{generate_key, KeyStore, DEFAULT_KEY_BITS};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "authgate-admin", version, about = "Key and token tooling for authgate")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate an RSA private key and write it as <kid>.pem
    Genkey {
        /// Directory the key file is written to
        #[arg(long, env = KEYS_DIR_ENV, default_value = "keys/")]
        dir: PathBuf,

        /// RSA modulus size
        #[arg(long, default_value_t = DEFAULT_KEY_BITS)]
        bits: usize,
    },

    /// Sign a token for a subject with the given roles
    Gentoken {
        #[arg(long, env = KEYS_DIR_ENV, default_value = "keys/")]
        keys_dir: PathBuf,

        /// KID of the signing key
        #[arg(long, env = ACTIVE_KID_ENV)]
        kid: String,

        #[arg(long, env = TOKEN_ISSUER_ENV, default_value = "authgate")]
        issuer: String,

        /// Token lifetime in seconds
        #[arg(long, default_value_t = 3600)]
        ttl_secs: i64,

        /// Subject (user id) the token is issued to
        subject: String,

        /// Roles to grant, e.g. ADMIN USER
        #[arg(required = true)]
        roles: Vec<Role>,
    },
}

fn main() -> Result<()> {
    match Cli::parse().command {
        Command::Genkey { dir, bits } => {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("creating {}", dir.display()))?;
            let (kid, path) = generate_key(&dir, bits).context("generating key")?;
            eprintln!("wrote {}", path.display());
            println!("{kid}");
        }
        Command::Gentoken {
            keys_dir,
            kid,
            issuer,
            ttl_secs,
            subject,
            roles,
        } => {
            let keys = KeyStore::from_dir(&keys_dir)
                .with_context(|| format!("loading keys from {}", keys_dir.display()))?;
            let auth = Authenticator::new(kid, Arc::new(keys)).context("building authenticator")?;

            let claims = Claims::new(subject, issuer, roles, Utc::now(), Duration::seconds(ttl_secs));
            let token = auth.generate_token(&claims).context("signing token")?;
            println!("{token}");
        }
    }
    Ok(())
}
