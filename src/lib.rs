//! vaultmaps - Render Vault secrets into sops-encrypted Kubernetes ConfigMaps.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── render        # Fetch, expand, write and encrypt a manifest
//! │   ├── expand        # Expand a flat blob locally
//! │   ├── flatten       # Turn YAML back into a flat blob
//! │   ├── completions   # Shell completions
//! │   └── output        # Terminal output helpers
//! └── core/             # Core library components
//!     ├── expand        # Dotted-key expansion
//!     ├── vault         # Vault HTTP client
//!     ├── manifest      # ConfigMap construction and writing
//!     ├── encrypt       # sops invocation
//!     ├── config        # vaultmaps.toml and settings resolution
//!     ├── validation    # Resource name validation
//!     └── constants     # Defaults
//! ```
//!
//! The secret blob is a comma-separated list of `dotted.key=value`
//! assignments:
//!
//! ```
//! use vaultmaps::core::expand::expand;
//!
//! let tree = expand("mysql.ro.password=a,mysql.rw.password=b").unwrap();
//! assert_eq!(tree.get("mysql.rw.password").and_then(|n| n.as_leaf()), Some("b"));
//! ```

pub mod cli;
pub mod core;
pub mod error;
