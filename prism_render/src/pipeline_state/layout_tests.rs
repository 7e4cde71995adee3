use super::*;
use crate::log;
use crate::test_utils::CaptureLogger;
use serial_test::serial;

fn uniform(binding: u32) -> DescriptorSetLayoutBinding {
    DescriptorSetLayoutBinding {
        binding,
        descriptor_type: DescriptorType::UniformBuffer,
        descriptor_count: 1,
        shader_stage_flags: ShaderStageFlags::VERTEX,
    }
}

#[test]
fn test_from_sets_places_sets_by_number() {
    let layout = PipelineLayout::from_sets(
        vec![
            DescriptorSetLayout::new(2, vec![uniform(0)]),
            DescriptorSetLayout::new(0, vec![uniform(1)]),
        ],
        PushConstant::default(),
    );

    assert_eq!(layout.set_mask(), 0b101);
    assert_eq!(layout.descriptor_set_count, 2);
    assert_eq!(layout.set(2).unwrap().bindings[0].binding, 0);
    assert!(layout.set(1).is_none());
}

#[test]
#[serial]
fn test_from_sets_warns_on_out_of_range_set() {
    let (logger, entries) = CaptureLogger::new();
    log::set_logger(logger);

    let layout = PipelineLayout::from_sets(
        vec![DescriptorSetLayout::new(5, vec![uniform(0)])],
        PushConstant::default(),
    );

    assert_eq!(layout.descriptor_set_count, 0);
    let warnings = CaptureLogger::from_source(&entries, "prism::PipelineLayout");
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("Descriptor set 5"));

    log::reset_logger();
}

#[test]
#[serial]
fn test_from_sets_keeps_first_duplicate_with_warning() {
    let (logger, entries) = CaptureLogger::new();
    log::set_logger(logger);

    let layout = PipelineLayout::from_sets(
        vec![
            DescriptorSetLayout::new(1, vec![uniform(0)]),
            DescriptorSetLayout::new(1, vec![uniform(7)]),
        ],
        PushConstant::default(),
    );

    assert_eq!(layout.set(1).unwrap().bindings[0].binding, 0);
    let warnings = CaptureLogger::from_source(&entries, "prism::PipelineLayout");
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("declared twice"));

    log::reset_logger();
}
