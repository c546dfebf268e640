//! 一个延迟渲染风格的 Pass 集合
//!
//! gbuffer → lighting → tonemap → present，外加一个没有消费者、会被裁剪的 debug pass。

use lattice_frame_graph::{FgHandle, FrameGraph};

use crate::fake_device::{BufferDesc, CommandList, FakeDevice, TextureDesc, TextureFormat};

pub type AppGraph<'a> = FrameGraph<'a, FakeDevice>;

#[derive(Default)]
pub struct GBufferData {
    pub albedo: Option<FgHandle>,
    pub normal: Option<FgHandle>,
    pub depth: Option<FgHandle>,
}

#[derive(Default)]
pub struct LightingData {
    pub lights: Option<FgHandle>,
    pub hdr: Option<FgHandle>,
}

#[derive(Default)]
pub struct TonemapData {
    pub hdr: Option<FgHandle>,
    pub output: Option<FgHandle>,
}

pub struct GBufferOutput {
    pub albedo: FgHandle,
    pub normal: FgHandle,
    pub depth: FgHandle,
}

pub fn add_gbuffer_pass<'a>(
    graph: &mut AppGraph<'a>,
    cmds: &'a CommandList,
    width: u32,
    height: u32,
) -> Option<GBufferOutput> {
    let data = graph.add_pass(
        "gbuffer",
        |builder, data: &mut GBufferData| {
            let albedo = builder.create("gbuffer.albedo", TextureDesc::new_2d(width, height, TextureFormat::Rgba8));
            let normal =
                builder.create("gbuffer.normal", TextureDesc::new_2d(width, height, TextureFormat::Rgba16Float));
            let depth = builder.create("gbuffer.depth", TextureDesc::new_2d(width, height, TextureFormat::D32Float));

            data.albedo = Some(builder.write(albedo));
            data.normal = Some(builder.write(normal));
            data.depth = Some(builder.write(depth));
        },
        move |data, resources| {
            for handle in [data.albedo, data.normal, data.depth].into_iter().flatten() {
                let target = resources.get(handle);
                cmds.record(resources.pass_name(), format!("clear #{} '{}'", target.id, target.name));
            }
            cmds.record(resources.pass_name(), "draw scene geometry");
        },
    );

    Some(GBufferOutput {
        albedo: data.albedo?,
        normal: data.normal?,
        depth: data.depth?,
    })
}

pub fn add_lighting_pass<'a>(
    graph: &mut AppGraph<'a>,
    cmds: &'a CommandList,
    gbuffer: &GBufferOutput,
    width: u32,
    height: u32,
    light_count: u32,
) -> Option<FgHandle> {
    let data = graph.add_pass(
        "lighting",
        |builder, data: &mut LightingData| {
            builder.read(gbuffer.albedo);
            builder.read(gbuffer.normal);
            builder.read(gbuffer.depth);

            let lights = builder.create(
                "lighting.lights",
                BufferDesc {
                    size: u64::from(light_count) * 64,
                },
            );
            data.lights = Some(builder.write(lights));
            data.hdr =
                Some(builder.create("lighting.hdr", TextureDesc::new_2d(width, height, TextureFormat::Rgba16Float)));
        },
        move |data, resources| {
            if let Some(lights) = data.lights.and_then(|h| resources.try_get(h)) {
                cmds.record(resources.pass_name(), format!("upload {} lights into #{}", light_count, lights.id));
            }
            if let Some(hdr) = data.hdr.and_then(|h| resources.try_get(h)) {
                cmds.record(resources.pass_name(), format!("fullscreen lighting into #{} '{}'", hdr.id, hdr.name));
            }
        },
    );
    data.hdr
}

/// 把 HDR 结果写入交换链图像，返回写入后的 backbuffer 句柄
pub fn add_tonemap_pass<'a>(
    graph: &mut AppGraph<'a>,
    cmds: &'a CommandList,
    hdr: FgHandle,
    backbuffer: FgHandle,
) -> Option<FgHandle> {
    let data = graph.add_pass(
        "tonemap",
        |builder, data: &mut TonemapData| {
            data.hdr = Some(builder.read(hdr));
            data.output = Some(builder.write(backbuffer));
        },
        move |data, resources| {
            let (Some(hdr), Some(output)) = (data.hdr, data.output) else {
                return;
            };
            cmds.record(
                resources.pass_name(),
                format!("aces {} -> {}", resources.get(hdr).describe(), resources.get(output).describe()),
            );
        },
    );
    data.output
}

/// 可视化深度，没有任何 Pass 读取它的输出，编译时会被裁剪
pub fn add_debug_depth_pass<'a>(
    graph: &mut AppGraph<'a>,
    cmds: &'a CommandList,
    depth: FgHandle,
    width: u32,
    height: u32,
) {
    graph.add_pass(
        "debug.depth",
        |builder, data: &mut Option<FgHandle>| {
            builder.read(depth);
            *data = Some(builder.create("debug.depth_view", TextureDesc::new_2d(width, height, TextureFormat::Rgba8)));
        },
        move |_, resources| cmds.record(resources.pass_name(), "visualize depth"),
    );
}

/// 提交交换链图像
pub fn add_present_pass<'a>(graph: &mut AppGraph<'a>, cmds: &'a CommandList, output: FgHandle) {
    graph.add_pass(
        "present",
        |builder, data: &mut Option<FgHandle>| {
            *data = Some(builder.read(output));
            builder.set_side_effect();
        },
        move |data, resources| {
            if let Some(image) = data.and_then(|h| resources.try_get(h)) {
                cmds.record(resources.pass_name(), format!("present '{}'", image.name));
            }
        },
    );
}
