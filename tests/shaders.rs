use std::path::Path;
use umbra::backend::programs;
use umbra::backend::validate_wgsl;

#[test]
fn test_shader_files_validate() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("shaders");
    for descriptor in [
        programs::scene_program(&root),
        programs::light_program(&root),
        programs::shadow_program(&root),
        programs::shadow_cube_program(&root),
    ] {
        let path = &descriptor.stages[0].path;
        let source = std::fs::read_to_string(path).unwrap();
        validate_wgsl(&source, path).unwrap_or_else(|err| panic!("{}: {err}", descriptor.label));
        assert_eq!(
            Some(source.as_str()),
            descriptor.embedded,
            "{} drifted from its embedded copy",
            descriptor.label
        );
    }
}

#[test]
fn test_broken_shader_is_rejected() {
    let result = validate_wgsl("fn vs_main( -> {", Path::new("broken.wgsl"));
    assert!(result.is_err());
}

#[test]
fn test_uniform_blocks_match_shader_structs() {
    assert_eq!(programs::scene_uniforms().size(), 496);
    assert_eq!(programs::shadow_cube_uniforms().size(), 480);
    assert_eq!(programs::light_uniforms().size(), 192);
    assert_eq!(programs::shadow_uniforms().size(), 128);
}
