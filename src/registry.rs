// Device registry projection: the asset and network records the core reads.
// Built once from config; the core never mutates it.

use std::collections::HashMap;

use crate::config::NetworkConfig;
use crate::models::{Asset, Network};

#[derive(Debug, Clone, Default)]
pub struct Registry {
    networks: Vec<Network>,
    assets: Vec<Asset>,
    by_id: HashMap<String, usize>,
}

impl Registry {
    /// Builds a registry from asset records; networks keep the order assets were given in.
    pub fn new(networks: Vec<(String, String)>, assets: Vec<Asset>) -> Self {
        let networks = networks
            .into_iter()
            .map(|(id, name)| Network {
                asset_ids: assets
                    .iter()
                    .filter(|a| a.network_id == id)
                    .map(|a| a.id.clone())
                    .collect(),
                id,
                name,
            })
            .collect();
        let by_id = assets
            .iter()
            .enumerate()
            .map(|(i, a)| (a.id.clone(), i))
            .collect();
        Self {
            networks,
            assets,
            by_id,
        }
    }

    pub fn from_config(networks: &[NetworkConfig]) -> Self {
        let assets = networks
            .iter()
            .flat_map(|n| {
                n.assets.iter().map(|a| Asset {
                    id: a.id.clone(),
                    network_id: n.id.clone(),
                    kind: a.kind,
                    telemetry_endpoint: a.endpoint.clone(),
                    max_pressure: a.max_pressure,
                    limits: a.limits,
                    maintenance: a.maintenance,
                    overrides: a.overrides(),
                })
            })
            .collect();
        let names = networks
            .iter()
            .map(|n| {
                let name = if n.name.is_empty() {
                    n.id.clone()
                } else {
                    n.name.clone()
                };
                (n.id.clone(), name)
            })
            .collect();
        Self::new(names, assets)
    }

    pub fn networks(&self) -> &[Network] {
        &self.networks
    }

    pub fn network(&self, id: &str) -> Option<&Network> {
        self.networks.iter().find(|n| n.id == id)
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn asset(&self, id: &str) -> Option<&Asset> {
        self.by_id.get(id).map(|&i| &self.assets[i])
    }
}
