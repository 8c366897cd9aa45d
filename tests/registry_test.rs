#![deny(warnings)]

use krs_dev::cmd::default_registry;
use krs_dev::delegate::{DelegatedSubverb, HandlerProgram};
use krs_dev::extension::register;
use krs_registry::{EXTENSION_POINT_VERSION, Namespace, RegistryError};

#[test]
fn declares_one_verb_and_thirteen_subverbs() {
    let registry = default_registry().unwrap();
    let verbs: Vec<&str> = registry.names(Namespace::VERB).collect();
    assert_eq!(verbs, ["acceleration"]);
    let subverbs: Vec<&str> = registry.names(Namespace::SUBVERB).collect();
    assert_eq!(
        subverbs,
        [
            "board",
            "emulation",
            "hls",
            "hypervisor",
            "linux",
            "list",
            "mkinitramfs",
            "mount",
            "platform",
            "select",
            "umount",
            "version",
            "v++",
        ]
    );
}

#[test]
fn every_record_accepts_the_extension_point() {
    let registry = default_registry().unwrap();
    for namespace in [Namespace::VERB, Namespace::SUBVERB] {
        for record in registry.records(namespace) {
            assert!(record.requirement.matches(&EXTENSION_POINT_VERSION));
        }
    }
}

#[test]
fn second_board_subverb_is_a_duplicate() {
    let mut registry = default_registry().unwrap();
    let err = register(
        &mut registry,
        Namespace::SUBVERB,
        Box::new(DelegatedSubverb::new(
            "board",
            "Another board handler",
            HandlerProgram::Path("other-board"),
        )),
    )
    .unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateName { .. }));
    assert_eq!(err.name(), "board");
    assert_eq!(registry.len(Namespace::SUBVERB), 13);
    let kept = registry.get(Namespace::SUBVERB, "board").unwrap();
    assert_eq!(kept.about(), "Report and configure the target board");
}

#[test]
fn subverb_names_may_repeat_across_namespaces() {
    let mut registry = default_registry().unwrap();
    register(
        &mut registry,
        Namespace::VERB,
        Box::new(DelegatedSubverb::new(
            "version",
            "Top-level version",
            HandlerProgram::Path("krs-version"),
        )),
    )
    .unwrap();
    assert_eq!(registry.len(Namespace::VERB), 2);
}
