//! States and cities lookup backed by the public IBGE localities service.
//!
//! The UF table is local so that write validation never waits on the remote
//! service; only the listing endpoints go over the network.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// The 26 states plus the Federal District.
pub const UFS: [&str; 27] = [
    "AC", "AL", "AP", "AM", "BA", "CE", "DF", "ES", "GO", "MA", "MT", "MS", "MG", "PA", "PB", "PR",
    "PE", "PI", "RJ", "RN", "RS", "RO", "RR", "SC", "SP", "SE", "TO",
];

pub fn is_valid_uf(uf: &str) -> bool {
    UFS.contains(&uf)
}

/// A federative unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct State {
    pub id: i64,
    pub uf: String,
    pub name: String,
}

/// A municipality within a state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct City {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct IbgeState {
    id: i64,
    sigla: String,
    nome: String,
}

#[derive(Debug, Deserialize)]
struct IbgeCity {
    id: i64,
    nome: String,
}

/// HTTP client for the localities service.
pub struct GeoClient {
    http: Client,
    base_url: String,
}

impl GeoClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, AppError> {
        let http = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// All states ordered by name.
    pub async fn states(&self) -> Result<Vec<State>, AppError> {
        let url = format!("{}/estados?orderBy=nome", self.base_url);
        let raw: Vec<IbgeState> = self.get_json(&url).await?;

        let mut states: Vec<State> = raw
            .into_iter()
            .map(|s| State {
                id: s.id,
                uf: s.sigla,
                name: s.nome,
            })
            .collect();
        states.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(states)
    }

    /// Cities of one state ordered by name.
    pub async fn cities(&self, uf: &str) -> Result<Vec<City>, AppError> {
        let uf = uf.trim().to_uppercase();
        if !is_valid_uf(&uf) {
            return Err(AppError::Validation(format!("Unknown state (UF): {}", uf)));
        }

        let url = format!("{}/estados/{}/municipios?orderBy=nome", self.base_url, uf);
        let raw: Vec<IbgeCity> = self.get_json(&url).await?;

        let mut cities: Vec<City> = raw
            .into_iter()
            .map(|c| City {
                id: c.id,
                name: c.nome,
            })
            .collect();
        cities.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(cities)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, AppError> {
        tracing::debug!("Fetching {}", url);
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Geography service answered {} for {}", status, url);
            return Err(AppError::Upstream(format!(
                "Geography service answered {}",
                status
            )));
        }

        Ok(response.json::<T>().await?)
    }
}
