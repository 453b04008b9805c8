use std::collections::HashSet;
use std::sync::Arc;
use vpl_dispatch_kernel::codes::{codec, color};
use vpl_dispatch_kernel::{
    ApiVersion, DispatchError, ImplType, LibPriority, PropertyValue, Range32U, Rankable, Status,
};
use vpl_dispatch_runtime::{DispatcherSettings, Loader, Session};
use vpl_dispatch_testing::fixtures::{self, CPU_IMPL_NAME, GPU_IMPL_NAME};
use vpl_dispatch_testing::{MockInstallation, MockLibrary, MockOpener, library_file_name};

const IMPL: &str = "mfxImplDescription.Impl";
const DECODER_CODEC: &str = "mfxImplDescription.mfxDecoderDescription.decoder.CodecID";
const API_VERSION: &str = "mfxImplDescription.ApiVersion.Version";
const IMPL_NAME: &str = "mfxImplDescription.ImplName";
const FUNCTION_NAME: &str = "mfxImplementedFunctions.FunctionsName";
const DEC_WIDTH: &str =
    "mfxImplDescription.mfxDecoderDescription.decoder.decprofile.decmemdesc.Width";
const DEC_COLOR: &str =
    "mfxImplDescription.mfxDecoderDescription.decoder.decprofile.decmemdesc.ColorFormats";

fn v(major: u16, minor: u16) -> ApiVersion {
    ApiVersion::new(major, minor)
}

fn names(loader: &mut vpl_dispatch_runtime::Loader) -> Vec<String> {
    loader
        .matching()
        .into_iter()
        .map(|c| c.description().impl_name.clone())
        .collect()
}

#[test]
fn test_software_decoder_scenario() {
    let install = MockInstallation::new();
    install.add("vplswref64", MockLibrary::new(fixtures::cpu_reference(v(2, 9))));
    let mut loader = install.loader();

    let sw = loader.create_config();
    loader
        .set_filter_property(sw, IMPL, PropertyValue::U32(ImplType::Software as u32))
        .unwrap();
    let dec = loader.create_config();
    loader
        .set_filter_property(dec, DECODER_CODEC, PropertyValue::U32(codec::HEVC))
        .unwrap();

    let desc = loader.enumerate(0).unwrap();
    assert_eq!(desc.impl_name, CPU_IMPL_NAME);
    assert_eq!(desc.impl_type, ImplType::Software);

    let err = loader.enumerate(1).unwrap_err();
    assert_eq!(err.current_context().status(), Status::NotFound);

    let session = loader.create_session(0).unwrap();
    assert_eq!(session.description().impl_name, CPU_IMPL_NAME);
    assert!(session.functions().contains("MFXInitEx"));
    assert!(session.functions().contains("MFXVideoDECODE_Init"));
    session.close().unwrap();
}

#[test]
fn test_no_configs_matches_everything() {
    let install = MockInstallation::new();
    install
        .add("vplswref64", MockLibrary::new(fixtures::cpu_reference(v(2, 9))))
        .add("mfx-gen", MockLibrary::new(fixtures::gpu(v(2, 9))));
    let mut loader = install.loader();

    assert!(!loader.is_discovered());
    assert_eq!(loader.matching().len(), 2);
    assert!(loader.is_discovered());
}

#[test]
fn test_configs_are_anded() {
    let install = MockInstallation::new();
    install
        .add("vplswref64", MockLibrary::new(fixtures::cpu_reference(v(2, 9))))
        .add("mfx-gen", MockLibrary::new(fixtures::gpu(v(2, 9))));
    let mut loader = install.loader();

    // VP9 only decodes on the GPU, JPEG only on the CPU.
    let a = loader.create_config();
    loader
        .set_filter_property(a, DECODER_CODEC, PropertyValue::U32(codec::VP9))
        .unwrap();
    assert_eq!(names(&mut loader), vec![GPU_IMPL_NAME]);

    let b = loader.create_config();
    loader
        .set_filter_property(b, DECODER_CODEC, PropertyValue::U32(codec::JPEG))
        .unwrap();
    assert!(loader.matching().is_empty());

    let err = loader.enumerate(0).unwrap_err();
    assert!(matches!(
        err.current_context(),
        DispatchError::NoMatchingImplementation
    ));
    assert_eq!(err.current_context().status(), Status::NotFound);
}

#[test]
fn test_adding_configs_never_grows_the_match_set() {
    let install = MockInstallation::new();
    install
        .add("vplswref64", MockLibrary::new(fixtures::cpu_reference(v(2, 9))))
        .add("mfx-gen", MockLibrary::new(fixtures::gpu(v(2, 9))))
        .add(
            "vp9only",
            MockLibrary::new(fixtures::single_decoder(
                "vp9only",
                ImplType::Software,
                v(2, 5),
                codec::VP9,
            )),
        );
    let mut loader = install.loader();

    let mut previous = names(&mut loader);
    let steps: Vec<(&str, PropertyValue)> = vec![
        (DECODER_CODEC, PropertyValue::U32(codec::VP9)),
        (API_VERSION, PropertyValue::U32(v(2, 6).as_u32())),
        (IMPL, PropertyValue::U32(ImplType::Hardware as u32)),
    ];
    for (path, value) in steps {
        let id = loader.create_config();
        loader.set_filter_property(id, path, value).unwrap();
        let current = names(&mut loader);
        assert!(current.iter().all(|name| previous.contains(name)));
        previous = current;
    }
    assert_eq!(previous, vec![GPU_IMPL_NAME]);
}

#[test]
fn test_version_filter_is_minimum_within_major() {
    let install = MockInstallation::new();
    install
        .add("old", MockLibrary::new(fixtures::single_decoder("old", ImplType::Software, v(2, 4), codec::AVC)))
        .add("new", MockLibrary::new(fixtures::single_decoder("new", ImplType::Software, v(2, 8), codec::AVC)));
    let mut loader = install.loader();

    let id = loader.create_config();
    loader
        .set_filter_property(id, API_VERSION, PropertyValue::U32(v(2, 5).as_u32()))
        .unwrap();
    assert_eq!(names(&mut loader), vec!["new"]);

    loader
        .set_filter_property(id, API_VERSION, PropertyValue::U32(v(2, 4).as_u32()))
        .unwrap();
    assert_eq!(names(&mut loader), vec!["old", "new"]);

    loader
        .set_filter_property(id, API_VERSION, PropertyValue::U32(v(1, 0).as_u32()))
        .unwrap();
    assert!(loader.matching().is_empty());
}

#[test]
fn test_unknown_property_keeps_previous_constraint() {
    let install = MockInstallation::new();
    install
        .add("vplswref64", MockLibrary::new(fixtures::cpu_reference(v(2, 9))))
        .add("mfx-gen", MockLibrary::new(fixtures::gpu(v(2, 9))));
    let mut loader = install.loader();

    let id = loader.create_config();
    loader
        .set_filter_property(id, IMPL, PropertyValue::U32(ImplType::Hardware as u32))
        .unwrap();
    assert_eq!(loader.matching().len(), 1);

    let err = loader
        .set_filter_property(id, "mfxImplDescription.NoSuchField", PropertyValue::U32(1))
        .unwrap_err();
    assert_eq!(err.current_context().status(), Status::NotFound);
    assert_eq!(names(&mut loader), vec![GPU_IMPL_NAME]);
}

#[test]
fn test_type_mismatch_rejects_everything_until_corrected() {
    let install = MockInstallation::new();
    install.add("vplswref64", MockLibrary::new(fixtures::cpu_reference(v(2, 9))));
    let mut loader = install.loader();

    let id = loader.create_config();
    let err = loader
        .set_filter_property(id, IMPL, PropertyValue::U16(1))
        .unwrap_err();
    assert_eq!(err.current_context().status(), Status::Unsupported);
    assert!(loader.matching().is_empty());

    loader
        .set_filter_property(id, IMPL, PropertyValue::U32(ImplType::Software as u32))
        .unwrap();
    assert_eq!(loader.matching().len(), 1);
}

#[test]
fn test_setting_the_same_property_twice_is_idempotent() {
    let install = MockInstallation::new();
    install
        .add("vplswref64", MockLibrary::new(fixtures::cpu_reference(v(2, 9))))
        .add("mfx-gen", MockLibrary::new(fixtures::gpu(v(2, 9))));
    let mut loader = install.loader();

    let id = loader.create_config();
    for _ in 0..2 {
        loader
            .set_filter_property(id, DECODER_CODEC, PropertyValue::U32(codec::JPEG))
            .unwrap();
        assert_eq!(names(&mut loader), vec![CPU_IMPL_NAME]);
    }
}

#[test]
fn test_later_set_replaces_constraint() {
    let install = MockInstallation::new();
    install
        .add("vplswref64", MockLibrary::new(fixtures::cpu_reference(v(2, 9))))
        .add("mfx-gen", MockLibrary::new(fixtures::gpu(v(2, 9))));
    let mut loader = install.loader();

    let id = loader.create_config();
    loader
        .set_filter_property(id, IMPL_NAME, PropertyValue::from(CPU_IMPL_NAME))
        .unwrap();
    assert_eq!(names(&mut loader), vec![CPU_IMPL_NAME]);

    loader
        .set_filter_property(id, DECODER_CODEC, PropertyValue::U32(codec::VP9))
        .unwrap();
    assert_eq!(names(&mut loader), vec![GPU_IMPL_NAME]);
}

#[test]
fn test_range_and_membership_filters() {
    let install = MockInstallation::new();
    install
        .add("vplswref64", MockLibrary::new(fixtures::cpu_reference(v(2, 9))))
        .add("mfx-gen", MockLibrary::new(fixtures::gpu(v(2, 9))));
    let mut loader = install.loader();

    let width = loader.create_config();
    loader
        .set_filter_property(width, DEC_WIDTH, PropertyValue::Range(Range32U::new(128, 1920, 16)))
        .unwrap();
    assert_eq!(loader.matching().len(), 2);

    // Only the GPU reaches 8K.
    loader
        .set_filter_property(width, DEC_WIDTH, PropertyValue::Range(Range32U::new(64, 8192, 16)))
        .unwrap();
    assert_eq!(names(&mut loader), vec![GPU_IMPL_NAME]);

    let color_fmt = loader.create_config();
    loader
        .set_filter_property(color_fmt, DEC_COLOR, PropertyValue::U32(color::I420))
        .unwrap();
    assert!(loader.matching().is_empty());

    loader
        .set_filter_property(color_fmt, DEC_COLOR, PropertyValue::U32(color::NV12))
        .unwrap();
    assert_eq!(names(&mut loader), vec![GPU_IMPL_NAME]);
}

#[test]
fn test_function_name_filter() {
    let install = MockInstallation::new();
    install
        .add("vplswref64", MockLibrary::new(fixtures::cpu_reference(v(2, 9))))
        .add("mfx-gen", MockLibrary::new(fixtures::gpu(v(2, 9))));
    let mut loader = install.loader();

    let id = loader.create_config();
    loader
        .set_filter_property(id, FUNCTION_NAME, PropertyValue::from("MFXVideoVPP_Init"))
        .unwrap();
    assert_eq!(names(&mut loader), vec![CPU_IMPL_NAME]);

    loader
        .set_filter_property(id, FUNCTION_NAME, PropertyValue::from("MFXVideoVPP"))
        .unwrap();
    assert!(loader.matching().is_empty());
}

#[test]
fn test_ranking_order() {
    let install = MockInstallation::new();
    install
        .add("a_sw_29", MockLibrary::new(fixtures::single_decoder("sw-2.9", ImplType::Software, v(2, 9), codec::AVC)))
        .add("b_hw_29", MockLibrary::new(fixtures::single_decoder("hw-2.9", ImplType::Hardware, v(2, 9), codec::AVC)))
        .add("c_sw_25", MockLibrary::new(fixtures::single_decoder("sw-2.5", ImplType::Software, v(2, 5), codec::AVC)));
    let mut loader = install.loader();

    assert_eq!(names(&mut loader), vec!["sw-2.5", "hw-2.9", "sw-2.9"]);
}

#[test]
fn test_full_ties_keep_discovery_order() {
    let install = MockInstallation::new();
    for stem in ["first", "second", "third"] {
        install.add(
            stem,
            MockLibrary::new(fixtures::single_decoder(stem, ImplType::Software, v(2, 7), codec::AVC)),
        );
    }
    let mut loader = install.loader();

    assert_eq!(names(&mut loader), vec!["first", "second", "third"]);
}

#[test]
fn test_broken_libraries_are_skipped() {
    let install = MockInstallation::new();
    install
        .add("vplswref64", MockLibrary::new(fixtures::cpu_reference(v(2, 9))))
        .add("noentry", MockLibrary::without_entry_points())
        .add_foreign("garbage");
    let mut loader = install.loader();

    assert_eq!(names(&mut loader), vec![CPU_IMPL_NAME]);
    assert_eq!(install.opener().open_count(), 1);
    // Discovery handles are released once descriptions are copied out.
    assert_eq!(install.opener().live_count(), 0);
}

#[test]
fn test_minimum_api_version_excludes_legacy_implementations() {
    let install = MockInstallation::new();
    install
        .add("legacy", MockLibrary::new(fixtures::single_decoder("legacy", ImplType::Hardware, v(1, 35), codec::AVC)))
        .add("vplswref64", MockLibrary::new(fixtures::cpu_reference(v(2, 9))));
    let mut loader = install.loader();
    assert_eq!(names(&mut loader), vec![CPU_IMPL_NAME]);

    let settings = install.settings().with_min_api_version(v(1, 0));
    let mut relaxed = vpl_dispatch_runtime::Loader::with_opener(
        settings,
        std::sync::Arc::new(install.opener().clone()),
    );
    assert_eq!(names(&mut relaxed), vec!["legacy", CPU_IMPL_NAME]);
}

#[test]
fn test_discovery_runs_once() {
    let install = MockInstallation::new();
    install.add("vplswref64", MockLibrary::new(fixtures::cpu_reference(v(2, 9))));
    let mut loader = install.loader();

    loader.enumerate(0).unwrap();
    loader.enumerate(0).unwrap();
    let id = loader.create_config();
    loader
        .set_filter_property(id, IMPL, PropertyValue::U32(ImplType::Software as u32))
        .unwrap();
    loader.enumerate(0).unwrap();
    assert_eq!(install.opener().open_count(), 1);
}

#[test]
fn test_failed_session_leaves_candidates_untouched() {
    let install = MockInstallation::new();
    install
        .add("failing", MockLibrary::new(fixtures::cpu_reference(v(2, 9))).with_init_status(-3))
        .add("nosyms", MockLibrary::new(fixtures::gpu(v(2, 9))).without_session_functions());
    let mut loader = install.loader();

    let before = names(&mut loader);
    assert_eq!(before.len(), 2);

    let err = loader.create_session(0).unwrap_err();
    assert!(matches!(
        err.current_context(),
        DispatchError::ImplementationUnavailable(_) | DispatchError::SessionInit(_)
    ));
    let err = loader.create_session(1).unwrap_err();
    assert!(matches!(
        err.current_context(),
        DispatchError::ImplementationUnavailable(_) | DispatchError::SessionInit(_)
    ));

    assert_eq!(names(&mut loader), before);
    assert_eq!(install.opener().live_count(), 0);
}

#[test]
fn test_init_failure_carries_runtime_status() {
    let install = MockInstallation::new();
    install.add("failing", MockLibrary::new(fixtures::cpu_reference(v(2, 9))).with_init_status(-3));
    let mut loader = install.loader();

    let err = loader.create_session(0).unwrap_err();
    assert!(matches!(err.current_context(), DispatchError::SessionInit(-3)));
    assert_eq!(err.current_context().code(), -3);
}

#[test]
fn test_session_outlives_loader() {
    let install = MockInstallation::new();
    install.add("vplswref64", MockLibrary::new(fixtures::cpu_reference(v(2, 9))));
    let mut loader = install.loader();

    let session = loader.create_session(0).unwrap();
    drop(loader);

    assert_eq!(install.opener().live_count(), 1);
    assert_eq!(session.description().impl_name, CPU_IMPL_NAME);
    session.close().unwrap();
    assert_eq!(install.opener().sessions_closed(), 1);
    assert_eq!(install.opener().live_count(), 0);
}

#[test]
fn test_dropping_a_session_closes_it() {
    let install = MockInstallation::new();
    install.add("vplswref64", MockLibrary::new(fixtures::cpu_reference(v(2, 9))));
    let mut loader = install.loader();

    let first = loader.create_session(0).unwrap();
    let second = loader.create_session(0).unwrap();
    assert_ne!(first.id(), second.id());
    assert_eq!(install.opener().sessions_started(), 2);

    drop(first);
    drop(second);
    assert_eq!(install.opener().sessions_closed(), 2);
    assert_eq!(install.opener().live_count(), 0);
}

#[test]
fn test_close_reports_runtime_failure() {
    let install = MockInstallation::new();
    install.add("vplswref64", MockLibrary::new(fixtures::cpu_reference(v(2, 9))).with_close_status(-1));
    let mut loader = install.loader();

    let session = loader.create_session(0).unwrap();
    let err = session.close().unwrap_err();
    assert!(matches!(err.current_context(), DispatchError::SessionClose(-1)));
    assert_eq!(install.opener().live_count(), 0);
}

#[test]
fn test_json_fixture_is_discoverable() {
    let desc = fixtures::from_json(
        r#"{
            "impl_type": "Hardware",
            "acceleration_mode": 1280,
            "api_version": { "major": 2, "minor": 10 },
            "impl_name": "json-gpu",
            "license": "",
            "keywords": "",
            "vendor_id": 32902,
            "vendor_impl_id": 0,
            "pool_policy": 0,
            "device": { "device_id": "56a0", "media_adapter_type": 1 },
            "decoders": [],
            "encoders": [],
            "vpp_filters": [],
            "implemented_functions": ["MFXInitEx", "MFXClose"]
        }"#,
    );
    let install = MockInstallation::new();
    install.add("jsongpu", MockLibrary::new(desc));
    let mut loader = install.loader();

    assert_eq!(names(&mut loader), vec!["json-gpu"]);
}

#[test]
fn test_single_hardware_candidate_without_configs() {
    let install = MockInstallation::new();
    install.add(
        "hw21",
        MockLibrary::new(fixtures::single_decoder("hw-2.1", ImplType::Hardware, v(2, 1), codec::AVC)),
    );
    let mut loader = install.loader();

    let desc = loader.enumerate(0).unwrap();
    assert_eq!(desc.impl_name, "hw-2.1");
    assert_eq!(desc.api_version, v(2, 1));
    assert_eq!(
        loader.enumerate(1).unwrap_err().current_context().status(),
        Status::NotFound
    );
    let session = loader.create_session(0).unwrap();
    assert!(session.runtime_handle().is_some());
}

#[test]
fn test_exclusive_codec_configs_block_session_creation() {
    let install = MockInstallation::new();
    install
        .add("avc", MockLibrary::new(fixtures::single_decoder("avc", ImplType::Software, v(2, 9), codec::AVC)))
        .add("hevc", MockLibrary::new(fixtures::single_decoder("hevc", ImplType::Software, v(2, 9), codec::HEVC)));

    for codec_id in [codec::AVC, codec::HEVC] {
        let mut loader = install.loader();
        let id = loader.create_config();
        loader
            .set_filter_property(id, DECODER_CODEC, PropertyValue::U32(codec_id))
            .unwrap();
        assert!(loader.create_session(0).is_ok());
    }

    let mut loader = install.loader();
    for codec_id in [codec::AVC, codec::HEVC] {
        let id = loader.create_config();
        loader
            .set_filter_property(id, DECODER_CODEC, PropertyValue::U32(codec_id))
            .unwrap();
    }
    let err = loader.create_session(0).unwrap_err();
    assert_eq!(err.current_context().status(), Status::NotFound);
}

#[test]
fn test_requesting_a_newer_minor_than_installed_fails() {
    let install = MockInstallation::new();
    install.add("vplswref64", MockLibrary::new(fixtures::cpu_reference(v(2, 9))));
    let mut loader = install.loader();

    let id = loader.create_config();
    loader
        .set_filter_property(id, API_VERSION, PropertyValue::U32(v(2, 9).as_u32()))
        .unwrap();
    assert!(loader.create_session(0).is_ok());

    loader
        .set_filter_property(id, API_VERSION, PropertyValue::U32(v(2, 10).as_u32()))
        .unwrap();
    let err = loader.create_session(0).unwrap_err();
    assert_eq!(err.current_context().status(), Status::NotFound);
}

#[test]
fn test_device_id_matches_text_or_numeric_form() {
    const DEVICE_ID: &str = "mfxImplDescription.mfxDeviceDescription.device.DeviceID";

    let install = MockInstallation::new();
    install.add("vplswref64", MockLibrary::new(fixtures::cpu_reference(v(2, 9))));

    for value in [PropertyValue::U16(0), PropertyValue::from("0000")] {
        let mut loader = install.loader();
        let config = loader.create_config();
        loader.set_filter_property(config, DEVICE_ID, value).unwrap();
        assert_eq!(loader.enumerate(0).unwrap().impl_name, CPU_IMPL_NAME);
    }

    for value in [PropertyValue::U16(0xefef), PropertyValue::from("efef")] {
        let mut loader = install.loader();
        let config = loader.create_config();
        loader.set_filter_property(config, DEVICE_ID, value).unwrap();
        let err = loader.enumerate(0).unwrap_err();
        assert_eq!(err.current_context().status(), Status::NotFound);
    }
}

fn two_tiers(user: &std::path::Path, package: &std::path::Path) -> DispatcherSettings {
    DispatcherSettings {
        search_paths: vec![user.to_path_buf()],
        package_dirs: vec![package.to_path_buf()],
        legacy_dirs: Vec::new(),
        min_api_version: v(2, 0),
    }
}

#[test]
fn test_directory_listed_in_two_tiers_yields_one_candidate() {
    let install = MockInstallation::new();
    install.add("vplswref64", MockLibrary::new(fixtures::cpu_reference(v(2, 9))));
    let settings = two_tiers(install.path(), install.path());
    let mut loader = Loader::with_opener(settings, Arc::new(install.opener().clone()));

    let candidates = loader.candidates();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].priority(), LibPriority::UserDefined);
    assert_eq!(install.opener().open_count(), 1);
}

#[cfg(unix)]
#[test]
fn test_linked_library_is_kept_at_the_higher_tier() {
    let user = tempfile::tempdir().unwrap();
    let package = MockInstallation::new();
    package.add("vplswref64", MockLibrary::new(fixtures::cpu_reference(v(2, 9))));

    let file_name = library_file_name("vplswref64");
    std::os::unix::fs::symlink(package.path().join(&file_name), user.path().join(&file_name)).unwrap();

    let settings = two_tiers(user.path(), package.path());
    let mut loader = Loader::with_opener(settings, Arc::new(package.opener().clone()));

    let candidates = loader.candidates();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].priority(), LibPriority::UserDefined);
    assert_eq!(candidates[0].path(), user.path().join(&file_name).as_path());
}

#[test]
fn test_discovery_orders_by_tier_before_api_version() {
    let user = tempfile::tempdir().unwrap();
    let package = tempfile::tempdir().unwrap();
    let opener = MockOpener::new();
    opener.install(
        user.path(),
        "user_dec",
        MockLibrary::new(fixtures::single_decoder("user", ImplType::Software, v(2, 1), codec::AVC)),
    );
    opener.install(
        package.path(),
        "package_dec",
        MockLibrary::new(fixtures::single_decoder("package", ImplType::Software, v(2, 0), codec::AVC)),
    );
    let mut loader = Loader::with_opener(two_tiers(user.path(), package.path()), Arc::new(opener));

    let found: Vec<_> = loader
        .candidates()
        .iter()
        .map(|c| (c.description().impl_name.clone(), c.priority()))
        .collect();
    assert_eq!(
        found,
        vec![
            ("user".to_string(), LibPriority::UserDefined),
            ("package".to_string(), LibPriority::Package),
        ]
    );

    // Selection ranks by API version first; the tier only breaks ties.
    assert_eq!(names(&mut loader), vec!["package", "user"]);
}

#[test]
fn test_equal_versions_rank_the_higher_tier_first() {
    let user = tempfile::tempdir().unwrap();
    let package = tempfile::tempdir().unwrap();
    let opener = MockOpener::new();
    opener.install(
        package.path(),
        "a_package_dec",
        MockLibrary::new(fixtures::single_decoder("package", ImplType::Software, v(2, 4), codec::AVC)),
    );
    opener.install(
        user.path(),
        "z_user_dec",
        MockLibrary::new(fixtures::single_decoder("user", ImplType::Software, v(2, 4), codec::AVC)),
    );
    let mut loader = Loader::with_opener(two_tiers(user.path(), package.path()), Arc::new(opener));

    assert_eq!(names(&mut loader), vec!["user", "package"]);
    assert_eq!(loader.enumerate(0).unwrap().impl_name, "user");
}

#[test]
fn test_loaders_on_separate_threads_are_independent() {
    const THREADS: usize = 8;
    const SESSIONS_PER_THREAD: usize = 4;

    let install = two_implementations();

    let sessions: Vec<Session> = std::thread::scope(|scope| {
        let workers: Vec<_> = (0..THREADS)
            .map(|worker| {
                let install = &install;
                scope.spawn(move || {
                    let mut loader = install.loader();
                    let config = loader.create_config();
                    let wanted = if worker % 2 == 0 { ImplType::Software } else { ImplType::Hardware };
                    loader
                        .set_filter_property(config, IMPL, PropertyValue::U32(wanted as u32))
                        .unwrap();

                    let desc = loader.enumerate(0).unwrap();
                    assert_eq!(desc.impl_type, wanted);
                    assert!(loader.is_discovered());

                    (0..SESSIONS_PER_THREAD)
                        .map(|_| {
                            let session = loader.create_session(0).unwrap();
                            assert_eq!(session.description().impl_type, wanted);
                            session
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        workers
            .into_iter()
            .flat_map(|worker| worker.join().unwrap())
            .collect()
    });

    let total = THREADS * SESSIONS_PER_THREAD;
    assert_eq!(sessions.len(), total);
    let ids: HashSet<_> = sessions.iter().map(Session::id).collect();
    assert_eq!(ids.len(), total);
    assert_eq!(install.opener().sessions_started(), total);
    // Every loader ran its own discovery over both libraries.
    assert_eq!(install.opener().open_count(), THREADS * 2 + total);

    for session in sessions {
        session.close().unwrap();
    }
    assert_eq!(install.opener().sessions_closed(), total);
    assert_eq!(install.opener().live_count(), 0);
}

fn two_implementations() -> MockInstallation {
    let install = MockInstallation::new();
    install
        .add("vplswref64", MockLibrary::new(fixtures::cpu_reference(v(2, 9))))
        .add("mfx-gen", MockLibrary::new(fixtures::gpu(v(2, 9))));
    install
}
