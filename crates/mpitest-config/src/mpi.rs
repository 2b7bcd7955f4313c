//! MPI implementation selection

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// MPI implementation used to launch test binaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MpiFlavor {
    /// MPICH (hydra `mpiexec`)
    Mpich,
    /// MVAPICH (`mpirun_rsh`)
    #[default]
    Mvapich,
    /// Open MPI (`mpirun`)
    Openmpi,
}

impl MpiFlavor {
    /// Get flavor name as accepted on the command line
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mpich => "mpich",
            Self::Mvapich => "mvapich",
            Self::Openmpi => "openmpi",
        }
    }

    /// Launcher program used when the toolchain does not name one
    pub fn default_launcher(&self) -> &'static str {
        match self {
            Self::Mpich => "mpiexec",
            Self::Mvapich => "mpirun_rsh",
            Self::Openmpi => "mpirun",
        }
    }

    /// Get all flavors
    pub fn all() -> [MpiFlavor; 3] {
        [Self::Mpich, Self::Mvapich, Self::Openmpi]
    }
}

impl fmt::Display for MpiFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MpiFlavor {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        let name = match lowered.as_str() {
            "mvapich2" => "mvapich",
            "open-mpi" => "openmpi",
            other => other,
        };
        Self::all()
            .into_iter()
            .find(|flavor| flavor.name() == name)
            .ok_or_else(|| ConfigError::UnknownMpi(s.to_string()))
    }
}
