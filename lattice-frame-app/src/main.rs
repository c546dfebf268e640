//! 用假设备驱动 frame graph 的示例程序
//!
//! 每帧声明 gbuffer → lighting → tonemap → present 管线，编译、执行，然后复用 graph。

mod fake_device;
mod passes;

use anyhow::Context;
use lattice_crate_tools::config::load_toml_or_default;
use lattice_crate_tools::init_log::init_log;
use lattice_crate_tools::path::LatticePath;
use lattice_frame_graph::{FgSettings, FrameGraph};
use serde::Deserialize;

use crate::fake_device::{CommandList, FakeDevice};
use crate::passes::AppGraph;

/// 程序配置，对应 `frame_graph.toml`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct LatticeAppConfig {
    /// 运行的帧数
    frames: u32,
    width: u32,
    height: u32,
    light_count: u32,
    graph: FgSettings,
}

impl Default for LatticeAppConfig {
    fn default() -> Self {
        Self {
            frames: 3,
            width: 1920,
            height: 1080,
            light_count: 8,
            graph: FgSettings::default(),
        }
    }
}

fn build_frame<'a>(
    graph: &mut AppGraph<'a>,
    cmds: &'a CommandList,
    config: &LatticeAppConfig,
    frame: u32,
) -> anyhow::Result<()> {
    let backbuffer = graph.factory_mut().acquire_backbuffer(frame, config.width, config.height);
    let backbuffer = graph.import("swapchain", backbuffer);

    let gbuffer = passes::add_gbuffer_pass(graph, cmds, config.width, config.height)
        .context("gbuffer pass did not declare its targets")?;
    let hdr = passes::add_lighting_pass(graph, cmds, &gbuffer, config.width, config.height, config.light_count)
        .context("lighting pass did not declare its output")?;
    passes::add_debug_depth_pass(graph, cmds, gbuffer.depth, config.width, config.height);
    let output =
        passes::add_tonemap_pass(graph, cmds, hdr, backbuffer).context("tonemap pass did not write the backbuffer")?;
    passes::add_present_pass(graph, cmds, output);

    Ok(())
}

fn run(config: &LatticeAppConfig) -> anyhow::Result<()> {
    #[cfg(feature = "profiling")]
    tracy_client::Client::start();

    let cmds = CommandList::default();
    let mut graph: AppGraph = FrameGraph::with_settings(FakeDevice::default(), config.graph);

    for frame in 0..config.frames {
        #[cfg(feature = "profiling")]
        let _span = tracy_client::span!("frame");

        build_frame(&mut graph, &cmds, config, frame)?;

        if !graph.compile() {
            let reason = graph.last_compile_error().map(|err| err.to_string()).unwrap_or_default();
            anyhow::bail!("frame {} failed to compile: {}", frame, reason);
        }
        graph.execute();

        let commands = cmds.submit();
        log::info!("frame {}: {} passes executed, {} commands", frame, graph.execution_order().len(), commands.len());
        for command in &commands {
            log::info!("  {}", command);
        }

        graph.reset();
        anyhow::ensure!(
            graph.factory().live_resources() == 0,
            "frame {} leaked {} resources",
            frame,
            graph.factory().live_resources()
        );

        #[cfg(feature = "profiling")]
        tracy_client::frame_mark();
    }

    let device = graph.factory();
    log::info!(
        "done: {} frames, {} transient resources created, peak {} alive at once",
        config.frames,
        device.total_created(),
        device.peak_live_resources()
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_log(log::LevelFilter::Info);

    let config_path = LatticePath::crate_path("lattice-frame-app").join("frame_graph.toml");
    let config: LatticeAppConfig = load_toml_or_default(&config_path)?;
    log::info!("config: {:?}", config);

    run(&config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_pass_is_culled_and_nothing_leaks() {
        let config = LatticeAppConfig {
            frames: 2,
            width: 64,
            height: 64,
            ..Default::default()
        };
        let cmds = CommandList::default();
        let mut graph: AppGraph = FrameGraph::with_settings(FakeDevice::default(), config.graph);

        build_frame(&mut graph, &cmds, &config, 0).unwrap();
        assert!(graph.compile());

        let names: Vec<&str> = graph.execution_order().iter().filter_map(|&id| graph.pass_name(id)).collect();
        assert_eq!(names, vec!["gbuffer", "lighting", "tonemap", "present"]);

        graph.execute();
        let commands = cmds.submit();
        assert!(commands.iter().any(|c| c.starts_with("[present]")));
        assert!(!commands.iter().any(|c| c.starts_with("[debug.depth]")));

        graph.reset();
        assert_eq!(graph.factory().live_resources(), 0);
        // gbuffer 三张、lights、hdr
        assert_eq!(graph.factory().total_created(), 5);
    }

    #[test]
    fn test_config_file_parses() {
        let config: LatticeAppConfig =
            load_toml_or_default(LatticePath::crate_path("lattice-frame-app").join("frame_graph.toml")).unwrap();
        assert!(config.frames > 0);
        assert!(config.graph.cull_passes);
    }
}
