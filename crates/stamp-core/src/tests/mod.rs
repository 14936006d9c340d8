//! Cross-module test suites and shared fixtures.

mod pipeline_tests;

use crate::contract::hash;
use crate::contract::{CONTRACT_SCHEMA_VERSION, CONTRACT_TYPE, Composition, Contract, Interface, Surface};
use crate::entry_id::EntryId;
use crate::model::{Exports, Kind};

pub(crate) fn id(raw: &str) -> EntryId {
    EntryId::new(raw).unwrap()
}

/// A component contract with the given composition and exports.
pub(crate) fn contract(entry: &str, components: &[&str], functions: &[&str], exports: Exports) -> Contract {
    let mut components: Vec<String> = components.iter().map(|s| s.to_string()).collect();
    components.sort();
    components.dedup();
    let mut functions: Vec<String> = functions.iter().map(|s| s.to_string()).collect();
    functions.sort();
    functions.dedup();

    let mut contract = Contract {
        contract_type: CONTRACT_TYPE.to_string(),
        schema_version: CONTRACT_SCHEMA_VERSION.to_string(),
        kind: Kind::ReactComponent,
        entry_id: id(entry),
        composition: Composition {
            components,
            functions,
            ..Composition::default()
        },
        surface: Surface::Interface(Interface::default()),
        exports,
        semantic_hash: String::new(),
        file_hash: hash::file_hash(entry),
        framework_meta: None,
    };
    contract.semantic_hash = contract.compute_semantic_hash().unwrap();
    contract
}

/// `src/<Name>.tsx` exporting `Name` and rendering `uses`.
pub(crate) fn component(name: &str, uses: &[&str]) -> Contract {
    contract(&format!("src/{name}.tsx"), uses, &[name], Exports::named([name]))
}
