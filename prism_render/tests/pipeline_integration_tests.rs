//! Integration tests for pipeline state objects
//!
//! These tests resolve shaders and graphics states per render slot through
//! `ShaderManager`, compile them with `PipelineStateCache`, and exchange
//! pipeline cache blobs with the device.
//! No GPU required.
//!
//! Run with: cargo test --test pipeline_integration_tests

use prism_render::device::mock_device::{MockGpuPipeline, MockGpuShaderProgram};
use prism_render::device::{Device, GpuPipeline, MockDevice, PipelineBindPoint, ShaderModuleDesc};
use prism_render::pipeline::{
    validate_pipeline_cache_data, PipelineCacheHeader, PIPELINE_CACHE_HEADER_SIZE,
};
use prism_render::pipeline_state::{
    CompareOp, DepthBias, DynamicStateFlags, Format, GraphicsState, RenderPassCompatibilityDesc,
    ShaderStageFlags,
};
use prism_render::reflection::ShaderReflection;
use prism_render::resource::GraphicsStateVariantDesc;
use prism_render::shader::{ComputeShaderDesc, ShaderDesc};
use prism_render::{PipelineStateCache, RenderHandle, ShaderManager, ShaderManagerConfig};
use std::sync::Arc;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn module(stage: ShaderStageFlags) -> ShaderModuleDesc {
    ShaderModuleDesc {
        stage,
        entry_point: "main".to_string(),
        code: vec![0; 16],
        reflection: ShaderReflection::default(),
    }
}

fn program_id(shaders: &ShaderManager, shader: RenderHandle) -> u64 {
    let program = shaders.gpu_shader_program(shader).unwrap();
    program.as_any().downcast_ref::<MockGpuShaderProgram>().unwrap().id
}

fn mock_pipeline(pipeline: &Arc<dyn GpuPipeline>) -> &MockGpuPipeline {
    pipeline.as_any().downcast_ref::<MockGpuPipeline>().unwrap()
}

fn scene_pass() -> RenderPassCompatibilityDesc {
    RenderPassCompatibilityDesc {
        depth_stencil_format: Format::D32_SFLOAT,
        ..RenderPassCompatibilityDesc::color(Format::R16G16B16A16_SFLOAT)
    }
}

fn shadow_pass() -> RenderPassCompatibilityDesc {
    RenderPassCompatibilityDesc {
        color_attachment_formats: Vec::new(),
        depth_stencil_format: Format::D32_SFLOAT,
        ..Default::default()
    }
}

// ============================================================================
// RENDER SLOT PIPELINE TESTS
// ============================================================================

#[test]
fn test_integration_pipeline_per_render_slot() {
    let device = Arc::new(MockDevice::new());
    let mut shaders = ShaderManager::new(device.clone(), ShaderManagerConfig::default());
    let mut pipelines = PipelineStateCache::new(device.clone());

    let forward = shaders.create_render_slot_id("forward");
    let shadow = shaders.create_render_slot_id("shadow");

    // Graphics states: an opaque base and its shadow-pass variant
    let mut opaque = GraphicsState::default();
    opaque.depth_stencil_state.enable_depth_test = true;
    opaque.depth_stencil_state.enable_depth_write = true;
    opaque.depth_stencil_state.depth_compare_op = CompareOp::LessOrEqual;
    let opaque_handle = shaders
        .create_graphics_state(
            "opaque",
            &opaque,
            Some(&GraphicsStateVariantDesc {
                render_slot_id: forward,
                ..Default::default()
            }),
        )
        .handle();

    let mut biased = opaque.clone();
    biased.rasterization_state.depth_bias = Some(DepthBias {
        constant_factor: 1.25,
        slope_factor: 1.75,
        clamp: 0.0,
    });
    let biased_handle = shaders
        .create_graphics_state(
            "opaque",
            &biased,
            Some(&GraphicsStateVariantDesc {
                render_slot_id: shadow,
                variant: "shadow".to_string(),
                base_state: "opaque".to_string(),
                base_variant: String::new(),
            }),
        )
        .handle();
    assert_eq!(shaders.graphics_state_handle_for_slot(opaque_handle, shadow).handle(), biased_handle);

    // Shaders: a lit base and its depth-only variant
    let vs = shaders.create_shader_module("rock.vert", module(ShaderStageFlags::VERTEX));
    let fs = shaders.create_shader_module("rock.frag", module(ShaderStageFlags::FRAGMENT));
    let depth_fs = shaders.create_shader_module("depth.frag", module(ShaderStageFlags::FRAGMENT));
    let rock = shaders
        .create_shader(ShaderDesc {
            render_slot_id: forward,
            graphics_state: Some(opaque_handle),
            ..ShaderDesc::new("rock.shader", vs, fs)
        })
        .handle();
    shaders.create_shader(ShaderDesc {
        render_slot_id: shadow,
        graphics_state: Some(biased_handle),
        base_shader_path: Some("rock.shader".to_string()),
        variant_name: "shadow".to_string(),
        ..ShaderDesc::new("rock.shader", vs, depth_fs)
    });
    shaders.handle_pending_allocations();

    // Frame loop: resolve per slot, then fetch the pipeline
    let flags = DynamicStateFlags::VIEWPORT | DynamicStateFlags::SCISSOR;
    let shadow_shader = shaders.shader_handle_for_slot(rock, shadow).handle();
    let shadow_state = shaders.graphics_state_handle_for_slot(opaque_handle, shadow).handle();
    let shadow_pipeline = pipelines
        .graphics_pipeline(&shaders, shadow_shader, shadow_state, &shadow_pass(), flags)
        .unwrap();
    let forward_pipeline = pipelines
        .graphics_pipeline(&shaders, rock, RenderHandle::INVALID, &scene_pass(), flags)
        .unwrap();

    assert_eq!(mock_pipeline(&shadow_pipeline).program_id, program_id(&shaders, shadow_shader));
    assert_eq!(mock_pipeline(&forward_pipeline).program_id, program_id(&shaders, rock));
    assert_eq!(mock_pipeline(&forward_pipeline).bind_point, PipelineBindPoint::Graphics);
    assert_eq!(pipelines.pipeline_count(), 2);
    assert_eq!(device.stats().graphics_pipelines, 2);

    // Second frame hits the cache
    device.advance_frame();
    let again = pipelines
        .graphics_pipeline(&shaders, shadow_shader, shadow_state, &shadow_pass(), flags)
        .unwrap();
    assert!(Arc::ptr_eq(&again, &shadow_pipeline));
    assert_eq!(device.stats().graphics_pipelines, 2);
}

#[test]
fn test_integration_hot_reload_rebuilds_pipelines() {
    let device = Arc::new(MockDevice::new());
    let mut shaders = ShaderManager::new(device.clone(), ShaderManagerConfig::default());
    let mut pipelines = PipelineStateCache::new(device.clone());

    let vs = shaders.create_shader_module("sky.vert", module(ShaderStageFlags::VERTEX));
    let fs = shaders.create_shader_module("sky.frag", module(ShaderStageFlags::FRAGMENT));
    let cs = shaders.create_shader_module("sky.comp", module(ShaderStageFlags::COMPUTE));
    let sky = shaders.create_shader(ShaderDesc::new("sky.shader", vs, fs)).handle();
    let bake = shaders
        .create_compute_shader(ComputeShaderDesc::new("sky_bake.shader", cs))
        .handle();
    shaders.handle_pending_allocations();

    let pass = scene_pass();
    let flags = DynamicStateFlags::default();
    let graphics_id = mock_pipeline(
        &pipelines
            .graphics_pipeline(&shaders, sky, RenderHandle::INVALID, &pass, flags)
            .unwrap(),
    )
    .id;
    let compute_id = mock_pipeline(&pipelines.compute_pipeline(&shaders, bake).unwrap()).id;

    // Editing both modules replaces both programs
    shaders.create_shader_module("sky.frag", module(ShaderStageFlags::FRAGMENT));
    shaders.create_shader_module("sky.comp", module(ShaderStageFlags::COMPUTE));
    shaders.handle_pending_allocations();

    let graphics = pipelines
        .graphics_pipeline(&shaders, sky, RenderHandle::INVALID, &pass, flags)
        .unwrap();
    let compute = pipelines.compute_pipeline(&shaders, bake).unwrap();
    assert_ne!(mock_pipeline(&graphics).id, graphics_id);
    assert_ne!(mock_pipeline(&compute).id, compute_id);
    assert_eq!(mock_pipeline(&compute).bind_point, PipelineBindPoint::Compute);
    assert_eq!(pipelines.pipeline_count(), 2);
    assert_eq!(pipelines.pending_deletion_count(), 2);

    // Replaced pipelines age out with the frames in flight
    device.advance_frames(4);
    pipelines.handle_pending_deletions(&shaders);
    assert_eq!(pipelines.pending_deletion_count(), 0);
}

#[test]
fn test_integration_destroyed_shader_has_no_pipeline() {
    let device = Arc::new(MockDevice::new());
    let mut shaders = ShaderManager::new(device.clone(), ShaderManagerConfig::default());
    let mut pipelines = PipelineStateCache::new(device.clone());

    let vs = shaders.create_shader_module("ui.vert", module(ShaderStageFlags::VERTEX));
    let fs = shaders.create_shader_module("ui.frag", module(ShaderStageFlags::FRAGMENT));
    let ui = shaders.create_shader(ShaderDesc::new("ui.shader", vs, fs)).handle();
    shaders.handle_pending_allocations();
    shaders.destroy(ui);

    let pipeline = pipelines.graphics_pipeline(
        &shaders,
        ui,
        RenderHandle::INVALID,
        &scene_pass(),
        DynamicStateFlags::default(),
    );
    assert!(pipeline.is_none());
}

// ============================================================================
// PIPELINE CACHE DATA TESTS
// ============================================================================

#[test]
fn test_integration_pipeline_cache_across_sessions() {
    // First session stores the cache
    let stored = {
        let device = Arc::new(MockDevice::new());
        let pipelines = PipelineStateCache::new(device.clone());
        let mut data = pipelines.store_pipeline_cache();
        assert_eq!(data.len(), PIPELINE_CACHE_HEADER_SIZE);
        data.extend_from_slice(&[7; 24]);
        data
    };

    // Second session on the same device model accepts it
    let device = Arc::new(MockDevice::new());
    let pipelines = PipelineStateCache::new(device.clone());
    assert!(validate_pipeline_cache_data(&stored, device.properties()));
    assert!(pipelines.load_pipeline_cache(&stored));
    assert_eq!(device.imported_pipeline_cache_payload(), vec![7; 24]);
    assert_eq!(pipelines.store_pipeline_cache(), stored);
}

#[test]
fn test_integration_pipeline_cache_rejects_bad_headers() {
    let device = Arc::new(MockDevice::new());
    let pipelines = PipelineStateCache::new(device.clone());
    let header = PipelineCacheHeader::new(device.properties());

    let mut other_vendor = header;
    other_vendor.vendor_id ^= 0xFFFF;
    let mut other_uuid = header;
    other_uuid.pipeline_cache_uuid[0] ^= 0xFF;
    let mut future_version = header;
    future_version.header_version = 2;
    let mut short_header = header;
    short_header.header_size = 16;
    let mut oversized_header = header;
    oversized_header.header_size = 64;

    for bad in [other_vendor, other_uuid, future_version, short_header, oversized_header] {
        assert!(!pipelines.load_pipeline_cache(&bad.to_bytes()));
    }
    assert!(!pipelines.load_pipeline_cache(&header.to_bytes()[..PIPELINE_CACHE_HEADER_SIZE - 1]));
    assert!(!pipelines.load_pipeline_cache(&[]));
    assert!(device.imported_pipeline_cache_payload().is_empty());
}
