use crate::db::Db;
use crate::errors::ApiError;
use crate::privacy::budget::BudgetLedger;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;
use zk_credentials::constants::{poseidon_config, MERKLE_DEPTH};
use zk_credentials::credentials::{DiversityCredentialCircuit, LeadershipCredentialCircuit};
use zk_credentials::error::CircuitError;
use zk_credentials::groth16::{
    deserialize_pk, deserialize_vk, serialize_pk, serialize_vk, setup_keys,
    DefaultAggregatorCircuit, DefaultCollaborationCircuit, DefaultLanguageCircuit,
    DefaultRepositoryCircuit, DefaultStatsCircuit,
};
use zk_credentials::types::CircuitId;

use ark_bn254::Bn254;
use ark_groth16::{ProvingKey, VerifyingKey};
use rand::rngs::OsRng;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub data_dir: PathBuf,
    pub keys: Arc<KeyStore>,
    pub ledger: Arc<BudgetLedger>,
    /// Deployment-wide identity salt.
    pub salt: String,
}

#[derive(Clone)]
pub struct ZkKeys {
    pub pk: Arc<ProvingKey<Bn254>>,
    pub vk: Arc<VerifyingKey<Bn254>>,
}

/// Lazily generated, disk-cached Groth16 keys, one pair per circuit shape.
pub struct KeyStore {
    data_dir: PathBuf,
    cells: HashMap<CircuitId, OnceCell<ZkKeys>>,
}

const ALL_CIRCUITS: [CircuitId; 7] = [
    CircuitId::RepositoryCredential,
    CircuitId::LanguageCredential,
    CircuitId::CollaborationCredential,
    CircuitId::LeadershipCredential,
    CircuitId::DiversityCredential,
    CircuitId::RepositoryAggregate,
    CircuitId::StatsAggregate,
];

/// Run the trusted setup (prototype) for one circuit shape.
///
/// IMPORTANT: In production, use MPC setup or a transparent proof system.
fn generate_keys(
    circuit_id: CircuitId,
) -> Result<(ProvingKey<Bn254>, VerifyingKey<Bn254>), CircuitError> {
    let cfg = poseidon_config();
    let mut rng = OsRng;
    match circuit_id {
        CircuitId::RepositoryCredential => {
            setup_keys(DefaultRepositoryCircuit::placeholder(&cfg, MERKLE_DEPTH), &mut rng)
        }
        CircuitId::LanguageCredential => {
            setup_keys(DefaultLanguageCircuit::placeholder(&cfg), &mut rng)
        }
        CircuitId::CollaborationCredential => {
            setup_keys(DefaultCollaborationCircuit::placeholder(&cfg), &mut rng)
        }
        CircuitId::LeadershipCredential => {
            setup_keys(LeadershipCredentialCircuit::placeholder(&cfg), &mut rng)
        }
        CircuitId::DiversityCredential => {
            setup_keys(DiversityCredentialCircuit::placeholder(&cfg), &mut rng)
        }
        CircuitId::RepositoryAggregate => {
            setup_keys(DefaultAggregatorCircuit::placeholder(&cfg), &mut rng)
        }
        CircuitId::StatsAggregate => setup_keys(DefaultStatsCircuit::placeholder(&cfg), &mut rng),
    }
}

impl KeyStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            cells: ALL_CIRCUITS
                .into_iter()
                .map(|id| (id, OnceCell::new()))
                .collect(),
        }
    }

    /// Ensure keys for `circuit_id` exist on disk and in memory.
    ///
    /// Runs the trusted setup (prototype) on first use.
    pub async fn ensure(&self, circuit_id: CircuitId) -> Result<ZkKeys, ApiError> {
        let cell = self.cells.get(&circuit_id).ok_or(ApiError::Internal)?;
        let data_dir = self.data_dir.clone();

        cell.get_or_try_init(|| async move {
            tokio::task::spawn_blocking(move || {
                let keys_dir = data_dir.join("keys");
                std::fs::create_dir_all(&keys_dir).map_err(|_| ApiError::Internal)?;

                let pk_path = keys_dir.join(format!("{}_pk.bin", circuit_id.as_str()));
                let vk_path = keys_dir.join(format!("{}_vk.bin", circuit_id.as_str()));

                if pk_path.exists() && vk_path.exists() {
                    let pk_bytes = std::fs::read(&pk_path).map_err(|_| ApiError::Internal)?;
                    let vk_bytes = std::fs::read(&vk_path).map_err(|_| ApiError::Internal)?;

                    let pk = deserialize_pk(&pk_bytes).map_err(|_| ApiError::Internal)?;
                    let vk = deserialize_vk(&vk_bytes).map_err(|_| ApiError::Internal)?;

                    return Ok::<ZkKeys, ApiError>(ZkKeys {
                        pk: Arc::new(pk),
                        vk: Arc::new(vk),
                    });
                }

                let (pk, vk) = generate_keys(circuit_id).map_err(|_| ApiError::Internal)?;

                let pk_bytes = serialize_pk(&pk).map_err(|_| ApiError::Internal)?;
                let vk_bytes = serialize_vk(&vk).map_err(|_| ApiError::Internal)?;

                std::fs::write(&pk_path, pk_bytes).map_err(|_| ApiError::Internal)?;
                std::fs::write(&vk_path, vk_bytes).map_err(|_| ApiError::Internal)?;

                Ok::<ZkKeys, ApiError>(ZkKeys {
                    pk: Arc::new(pk),
                    vk: Arc::new(vk),
                })
            })
            .await
            .map_err(|_| ApiError::Internal)?
        })
        .await
        .cloned()
    }
}

impl AppState {
    pub fn new(db: Db, data_dir: PathBuf, ledger: BudgetLedger, salt: String) -> Self {
        Self {
            keys: Arc::new(KeyStore::new(data_dir.clone())),
            db,
            data_dir,
            ledger: Arc::new(ledger),
            salt,
        }
    }
}
