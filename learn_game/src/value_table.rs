use crate::board::BoardKey;
use crate::error::{PolicyLoadError, PolicySaveError};
use chrono::offset::Local;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::ops::Deref;
use std::path::PathBuf;
use std::{fmt, fs, str::FromStr};

/// Estimated value of every board state an agent has reached with its own
/// moves. States that were never visited read as `0.0`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValueTable {
    values: HashMap<BoardKey, f64>,
}

/// Encoding used for exported value tables.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyFormat {
    #[default]
    Pickle,
    Json,
}

/// On-disk envelope around a value table.
#[derive(Serialize, Deserialize)]
struct PolicyFile<T> {
    agent: String,
    saved_at: String,
    values: T,
}

/// Saves and loads value tables as `policy_<agent>.<ext>` files in one directory.
#[derive(Clone, Debug)]
pub struct PolicyStore {
    dir: PathBuf,
    format: PolicyFormat,
}

impl Deref for ValueTable {
    type Target = HashMap<BoardKey, f64>;
    fn deref(&self) -> &<Self as Deref>::Target {
        &self.values
    }
}

impl ValueTable {
    pub fn new() -> Self {
        ValueTable {
            values: HashMap::with_capacity(6000),
        }
    }

    pub fn value(&self, key: &BoardKey) -> f64 {
        self.values.get(key).copied().unwrap_or(0.0)
    }

    /// Moves the estimate for `key` toward `discount_factor * target` by
    /// `learning_rate` and returns the updated estimate.
    pub fn update(
        &mut self,
        key: &BoardKey,
        target: f64,
        learning_rate: f64,
        discount_factor: f64,
    ) -> f64 {
        let value = self.values.entry(key.clone()).or_insert(0.0);
        *value += learning_rate * (discount_factor * target - *value);
        *value
    }

    pub fn to_bytes(&self, format: PolicyFormat) -> Result<Vec<u8>, PolicySaveError> {
        encode(self, format)
    }

    pub fn from_bytes(format: PolicyFormat, bytes: &[u8]) -> Result<Self, PolicyLoadError> {
        let raw: HashMap<String, f64> = decode(format, bytes)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: HashMap<String, f64>) -> Result<Self, PolicyLoadError> {
        let mut values = HashMap::with_capacity(raw.len());
        for (key, value) in raw {
            if !value.is_finite() {
                return Err(PolicyLoadError::NonFiniteValue { key, value });
            }
            values.insert(key.parse::<BoardKey>()?, value);
        }
        Ok(ValueTable { values })
    }
}

impl FromIterator<(BoardKey, f64)> for ValueTable {
    fn from_iter<I: IntoIterator<Item = (BoardKey, f64)>>(iter: I) -> Self {
        ValueTable {
            values: iter.into_iter().collect(),
        }
    }
}

impl PolicyFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Pickle => "pickle",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for PolicyFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for PolicyFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pickle" => Ok(Self::Pickle),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown policy format '{other}' (expected 'pickle' or 'json')")),
        }
    }
}

fn encode<T: Serialize>(value: &T, format: PolicyFormat) -> Result<Vec<u8>, PolicySaveError> {
    Ok(match format {
        PolicyFormat::Pickle => serde_pickle::to_vec(value, serde_pickle::SerOptions::new())?,
        PolicyFormat::Json => serde_json::to_vec(value)?,
    })
}

fn decode<T: for<'de> Deserialize<'de>>(
    format: PolicyFormat,
    bytes: &[u8],
) -> Result<T, PolicyLoadError> {
    Ok(match format {
        PolicyFormat::Pickle => serde_pickle::from_slice(bytes, serde_pickle::DeOptions::new())?,
        PolicyFormat::Json => serde_json::from_slice(bytes)?,
    })
}

impl PolicyStore {
    pub fn new(dir: impl Into<PathBuf>, format: PolicyFormat) -> Self {
        PolicyStore {
            dir: dir.into(),
            format,
        }
    }

    pub fn path_for(&self, agent: &str) -> PathBuf {
        self.dir
            .join(format!("policy_{agent}.{}", self.format.extension()))
    }

    pub fn save(&self, agent: &str, table: &ValueTable) -> Result<PathBuf, PolicySaveError> {
        let path = self.path_for(agent);
        let file = PolicyFile {
            agent: agent.to_owned(),
            saved_at: Local::now().to_rfc3339(),
            values: table,
        };
        let bytes = encode(&file, self.format)?;
        fs::create_dir_all(&self.dir)
            .and_then(|_| fs::write(&path, bytes))
            .map_err(|source| PolicySaveError::Write {
                path: path.clone(),
                source,
            })?;
        log::info!(
            "Saved {} states for agent {agent} to {}",
            table.len(),
            path.display()
        );
        Ok(path)
    }

    pub fn load(&self, agent: &str) -> Result<ValueTable, PolicyLoadError> {
        let path = self.path_for(agent);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(PolicyLoadError::NotFound(path))
            }
            Err(source) => return Err(PolicyLoadError::Read { path, source }),
        };
        let file: PolicyFile<HashMap<String, f64>> = decode(self.format, &bytes)?;
        if file.agent != agent {
            return Err(PolicyLoadError::AgentMismatch {
                expected: agent.to_owned(),
                found: file.agent,
            });
        }
        let table = ValueTable::from_raw(file.values)?;
        log::info!(
            "Loaded {} states for agent {agent} saved at {}",
            table.len(),
            file.saved_at
        );
        Ok(table)
    }
}
