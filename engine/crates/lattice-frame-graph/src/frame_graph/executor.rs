//! FrameGraph 本体：声明、编译和执行
//!
//! # 使用流程
//!
//! 1. 创建 graph: `FrameGraph::new(factory)`
//! 2. 导入外部资源: `graph.import(...)`
//! 3. 添加 Pass: `graph.add_pass("name", setup, execute)`
//! 4. 标记帧输出: `graph.export(handle)`
//! 5. 编译: `graph.compile()`，返回 false 时丢弃本帧
//! 6. 执行: `graph.execute()`
//! 7. 下一帧前: `graph.reset()`

use indexmap::IndexSet;
use slotmap::SecondaryMap;

use super::builder::FgBuilder;
use super::error::FgCompileError;
use super::graph::FgDependencyGraph;
use super::handle::{FgHandle, FgPassId, FgResourceId};
use super::pass::{FgPassExecutor, FgPassExecutorWrapper, FgPassNode, FgPassResources};
use super::resource::FgResourceFactory;
use super::resource_registry::FgResourceRegistry;
use super::settings::FgSettings;

/// 资源条目在执行顺序中的存活区间（闭区间，下标为执行序号）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FgLifetime {
    /// 第一个使用该资源的 Pass 的执行序号
    pub first: usize,
    /// 最后一个使用该资源的 Pass 的执行序号
    pub last: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FgGraphState {
    /// 正在声明 Pass，或者上一次编译已经失效
    Building,
    Compiled,
    Executed,
}

/// 每帧重建的渲染图
///
/// # 生命周期
///
/// `'a` 是 Pass 的 execute 闭包可以借用的外部数据的生命周期，
/// 闭包可以直接引用外部的命令列表、pipeline 等对象，不需要 Rc/Arc 包装。
///
/// # 复用
///
/// `reset()` 之后 graph 可以在下一帧继续使用，工厂和设置保持不变。
pub struct FrameGraph<'a, F: FgResourceFactory> {
    /// 图形层提供的资源工厂
    factory: F,
    settings: FgSettings,

    /// 资源注册表
    registry: FgResourceRegistry<F>,
    /// Pass 节点列表（按声明顺序，下标即 `FgPassId`）
    passes: Vec<FgPassNode>,
    /// 与 `passes` 一一对应的执行器
    executors: Vec<Box<dyn FgPassExecutor<F> + 'a>>,
    /// 导出的资源版本
    exports: IndexSet<FgHandle>,

    state: FgGraphState,
    last_compile_error: Option<FgCompileError>,

    /// 编译结果：存活 Pass 的执行顺序
    execution_order: Vec<FgPassId>,
    /// 编译结果：每个被使用的资源条目的存活区间
    lifetimes: SecondaryMap<FgResourceId, FgLifetime>,
    /// 编译结果：执行序号 -> 在该 Pass 之前创建的资源
    construct_at: Vec<Vec<FgResourceId>>,
    /// 编译结果：执行序号 -> 在该 Pass 之后销毁的资源
    destroy_at: Vec<Vec<FgResourceId>>,
}

// new & init
impl<'a, F: FgResourceFactory> FrameGraph<'a, F> {
    /// 使用默认设置创建 graph
    pub fn new(factory: F) -> Self {
        Self::with_settings(factory, FgSettings::default())
    }

    pub fn with_settings(factory: F, settings: FgSettings) -> Self {
        Self {
            factory,
            settings,
            registry: FgResourceRegistry::new(),
            passes: Vec::new(),
            executors: Vec::new(),
            exports: IndexSet::new(),
            state: FgGraphState::Building,
            last_compile_error: None,
            execution_order: Vec::new(),
            lifetimes: SecondaryMap::new(),
            construct_at: Vec::new(),
            destroy_at: Vec::new(),
        }
    }
}

// declare
impl<'a, F: FgResourceFactory> FrameGraph<'a, F> {
    /// 添加 Pass
    ///
    /// `setup` 会被立即调用一次，用于声明资源依赖并填充 Pass 数据；
    /// `execute` 保存到 `execute()` 时按编译后的顺序调用，被裁剪的 Pass 不会执行。
    ///
    /// # 参数
    /// - `name`: Pass 名称，用于调试输出
    /// - `setup`: 声明阶段回调
    /// - `execute`: 执行阶段回调
    ///
    /// # 返回
    /// setup 填充后的 Pass 数据
    ///
    /// # Panics
    /// graph 已经执行过且尚未 `reset()`
    pub fn add_pass<D, S, E>(&mut self, name: impl Into<String>, setup: S, execute: E) -> &D
    where
        D: Default + 'static,
        S: FnOnce(&mut FgBuilder<'_, F>, &mut D),
        E: FnOnce(&D, &FgPassResources<'_, F>) + 'a,
    {
        self.begin_mutation("add_pass");

        let id = FgPassId::from_index(self.passes.len());
        let mut pass = FgPassNode::new(id, name.into());
        let mut data = D::default();
        setup(&mut FgBuilder::new(&mut pass, &mut self.registry), &mut data);

        log::trace!(
            "FrameGraph: add pass {} '{}' (creates {}, reads {}, writes {})",
            id,
            pass.name,
            pass.creates.len(),
            pass.reads.len(),
            pass.writes.len()
        );

        self.passes.push(pass);
        self.executors.push(Box::new(FgPassExecutorWrapper::new(data, execute)));

        match self.executors[id.index()].data().downcast_ref::<D>() {
            Some(data) => data,
            None => unreachable!("FrameGraph: pass data type mismatch"),
        }
    }

    /// 导入外部已经存在的资源
    ///
    /// 导入的资源没有产出它的 Pass，graph 既不会创建也不会销毁它。
    ///
    /// # Panics
    /// 名称已被占用
    pub fn import(&mut self, name: impl Into<String>, resource: F::Resource) -> FgHandle {
        self.begin_mutation("import");
        self.registry.register_imported(name.into(), resource)
    }

    /// 标记资源版本在 graph 之外被使用
    ///
    /// 产出该版本的 Pass 成为裁剪的起点；执行结束后资源保留到 `reset()`。
    ///
    /// # Panics
    /// 句柄已过期
    pub fn export(&mut self, handle: FgHandle) {
        self.begin_mutation("export");
        assert!(
            self.registry.is_valid(handle),
            "FrameGraph: cannot export stale or unknown handle {:?} of '{}'",
            handle,
            self.registry.name(handle.resource)
        );
        self.exports.insert(handle);
    }

    /// 在 Pass 之外为资源推进一个新版本
    ///
    /// 新版本没有产出 Pass，内容是该资源最后一个产出 Pass 写入的内容；
    /// 这个 Pass 不会因此被视为"被需要"。
    ///
    /// # Panics
    /// 句柄已过期
    pub fn clone_resource(&mut self, handle: FgHandle) -> FgHandle {
        self.begin_mutation("clone_resource");
        self.registry.clone_resource(handle, None)
    }

    /// 修改图结构之前调用：使已有的编译结果失效
    fn begin_mutation(&mut self, op: &str) {
        assert!(
            self.state != FgGraphState::Executed,
            "FrameGraph: {}() after execute(), call reset() first",
            op
        );
        if self.state == FgGraphState::Compiled {
            log::debug!("FrameGraph: {}() invalidates the compiled graph", op);
            self.clear_compiled();
            self.state = FgGraphState::Building;
        }
    }
}

// compile
impl<'a, F: FgResourceFactory> FrameGraph<'a, F> {
    /// 编译 graph
    ///
    /// 失败时记录 error 日志，原因可以通过 `last_compile_error()` 获取。
    ///
    /// # 返回
    /// 是否可以调用 `execute()`
    pub fn compile(&mut self) -> bool {
        match self.try_compile() {
            Ok(()) => {
                self.last_compile_error = None;
                if self.settings.log_execution_plan {
                    self.print_execution_plan();
                }
                true
            }
            Err(err) => {
                log::error!("FrameGraph: compile failed: {}", err);
                self.last_compile_error = Some(err);
                false
            }
        }
    }

    /// 编译 graph
    ///
    /// 1. 从有副作用的 Pass 和导出资源出发反向标记，裁剪其余 Pass
    /// 2. 检查存活 Pass 读取的内容都来自存活 Pass
    /// 3. 拓扑排序得到执行顺序
    /// 4. 计算每个资源条目的存活区间
    ///
    /// # Panics
    /// graph 已经执行过且尚未 `reset()`
    pub fn try_compile(&mut self) -> Result<(), FgCompileError> {
        let _span = profile_span!("FrameGraph::compile");
        assert!(
            self.state != FgGraphState::Executed,
            "FrameGraph: compile() after execute(), call reset() first"
        );

        self.clear_compiled();
        self.state = FgGraphState::Building;

        self.cull_passes();
        self.validate()?;

        let order = self.build_dependency_graph().topological_sort().map_err(|cycle| {
            FgCompileError::CyclicDependency {
                passes: cycle.into_iter().map(|id| self.passes[id.index()].name.clone()).collect(),
            }
        })?;
        self.execution_order = order;
        self.compute_lifetimes();

        if log::log_enabled!(log::Level::Debug) {
            let culled: Vec<&str> =
                self.passes.iter().filter(|pass| !pass.can_execute()).map(|pass| pass.name.as_str()).collect();
            log::debug!(
                "FrameGraph: compiled {} of {} passes, culled [{}]",
                self.execution_order.len(),
                self.passes.len(),
                culled.join(", ")
            );
        }

        self.state = FgGraphState::Compiled;
        Ok(())
    }

    /// 反向标记被需要的 Pass，`ref_count > 0` 即存活
    fn cull_passes(&mut self) {
        for pass in &mut self.passes {
            pass.ref_count = 0;
        }

        let mut stack = Vec::new();
        let retain = |passes: &mut [FgPassNode], stack: &mut Vec<FgPassId>, id: FgPassId| {
            let pass = &mut passes[id.index()];
            pass.ref_count += 1;
            if pass.ref_count == 1 {
                stack.push(id);
            }
        };

        for id in 0..self.passes.len() {
            let pass = &self.passes[id];
            if pass.side_effect || !self.settings.cull_passes {
                let id = pass.id;
                retain(&mut self.passes, &mut stack, id);
            }
        }
        for &handle in &self.exports {
            if let Some(producer) = self.registry.node(handle).and_then(|node| node.producer) {
                retain(&mut self.passes, &mut stack, producer);
            }
        }

        while let Some(id) = stack.pop() {
            let reads: Vec<FgHandle> = self.passes[id.index()].reads().collect();
            for handle in reads {
                if let Some(producer) = self.registry.node(handle).and_then(|node| node.producer) {
                    retain(&mut self.passes, &mut stack, producer);
                }
            }
        }
    }

    /// 存活 Pass 读取的内容、导出的内容都必须由存活 Pass 产出
    fn validate(&self) -> Result<(), FgCompileError> {
        for pass in self.passes.iter().filter(|pass| pass.can_execute()) {
            for handle in pass.reads() {
                if let Some(source) = self.culled_source(handle) {
                    return Err(FgCompileError::DanglingRead {
                        pass: pass.name.clone(),
                        resource: self.registry.name(handle.resource).to_string(),
                        producer: source.name.clone(),
                    });
                }
            }
        }

        for &handle in &self.exports {
            if let Some(source) = self.culled_source(handle) {
                return Err(FgCompileError::DanglingExport {
                    resource: self.registry.name(handle.resource).to_string(),
                    producer: source.name.clone(),
                });
            }
            if !self.registry.is_valid(handle) {
                log::warn!(
                    "FrameGraph: exported '{}' {:?} was overwritten by a later version",
                    self.registry.name(handle.resource),
                    handle
                );
            }
        }

        Ok(())
    }

    /// 内容来源 Pass 被裁剪时返回该 Pass
    fn culled_source(&self, handle: FgHandle) -> Option<&FgPassNode> {
        let source = self.registry.node(handle)?.last_pass?;
        let pass = &self.passes[source.index()];
        (!pass.can_execute()).then_some(pass)
    }

    /// 构建存活 Pass 之间的依赖图
    ///
    /// - 读依赖：内容来源 Pass 先于读取者
    /// - 版本依赖：读取版本 v 的 Pass 先于产出下一个版本的 Pass（所有版本共用同一个物理资源）
    pub(crate) fn build_dependency_graph(&self) -> FgDependencyGraph {
        let alive = || self.passes.iter().filter(|pass| pass.can_execute());
        let mut graph = FgDependencyGraph::new(alive().map(|pass| pass.id));

        for pass in alive() {
            for handle in pass.reads() {
                let Some(node) = self.registry.node(handle) else {
                    continue;
                };
                if let Some(source) = node.last_pass {
                    graph.add_edge(source, pass.id, handle);
                }
                if let Some(writer) = self.next_writer(handle) {
                    graph.add_edge(pass.id, writer, handle);
                }
            }
        }

        graph
    }

    /// 在 `handle` 之后第一个由存活 Pass 产出的版本的 Pass
    fn next_writer(&self, handle: FgHandle) -> Option<FgPassId> {
        self.registry
            .get(handle.resource)?
            .nodes()
            .skip(handle.version as usize)
            .filter_map(|node| node.producer)
            .find(|producer| self.passes[producer.index()].can_execute())
    }

    fn compute_lifetimes(&mut self) {
        for (index, &id) in self.execution_order.iter().enumerate() {
            for handle in self.passes[id.index()].declared() {
                match self.lifetimes.get_mut(handle.resource) {
                    Some(lifetime) => lifetime.last = index,
                    None => {
                        self.lifetimes.insert(
                            handle.resource,
                            FgLifetime {
                                first: index,
                                last: index,
                            },
                        );
                    }
                }
            }
        }

        self.construct_at = vec![Vec::new(); self.execution_order.len()];
        self.destroy_at = vec![Vec::new(); self.execution_order.len()];
        for (id, lifetime) in &self.lifetimes {
            let Some(entry) = self.registry.get(id) else {
                continue;
            };
            if entry.is_imported() {
                continue;
            }
            self.construct_at[lifetime.first].push(id);
            if !self.exports.iter().any(|handle| handle.resource == id) {
                self.destroy_at[lifetime.last].push(id);
            }
        }
    }

    fn clear_compiled(&mut self) {
        for pass in &mut self.passes {
            pass.ref_count = 0;
        }
        self.execution_order.clear();
        self.lifetimes.clear();
        self.construct_at.clear();
        self.destroy_at.clear();
    }
}

// execute & reset
impl<'a, F: FgResourceFactory> FrameGraph<'a, F> {
    /// 按编译后的顺序执行所有存活的 Pass
    ///
    /// 资源在第一个使用它的 Pass 之前创建，在最后一个使用它的 Pass 之后销毁；
    /// 导出的资源保留到 `reset()`。
    ///
    /// # Panics
    /// 没有成功编译，或编译之后又修改了 graph
    pub fn execute(&mut self) {
        let _span = profile_span!("FrameGraph::execute");
        assert!(
            self.state == FgGraphState::Compiled,
            "FrameGraph: execute() requires a successful compile()"
        );

        for (index, &id) in self.execution_order.iter().enumerate() {
            for &resource in &self.construct_at[index] {
                if let Some(entry) = self.registry.get_mut(resource) {
                    entry.construct_resource(&mut self.factory);
                }
            }

            let pass = &self.passes[id.index()];
            log::trace!("FrameGraph: execute pass [{}/{}] '{}'", index + 1, self.execution_order.len(), pass.name);
            let resources = FgPassResources::new(pass, &self.registry);
            self.executors[id.index()].execute(&resources);

            for &resource in &self.destroy_at[index] {
                if let Some(entry) = self.registry.get_mut(resource) {
                    entry.destroy_resource(&mut self.factory);
                }
            }
        }

        self.state = FgGraphState::Executed;
    }

    /// 销毁剩余的物理资源并清空所有 Pass 与资源，保留工厂和设置
    ///
    /// 之前发出的所有句柄都会失效。
    pub fn reset(&mut self) {
        self.destroy_resources();
        self.registry.clear();
        self.passes.clear();
        self.executors.clear();
        self.exports.clear();
        self.clear_compiled();
        self.last_compile_error = None;
        self.state = FgGraphState::Building;
    }

    fn destroy_resources(&mut self) {
        for (_, entry) in self.registry.iter_mut() {
            entry.destroy_resource(&mut self.factory);
        }
    }
}

impl<F: FgResourceFactory> Drop for FrameGraph<'_, F> {
    fn drop(&mut self) {
        self.destroy_resources();
    }
}

// getter
impl<'a, F: FgResourceFactory> FrameGraph<'a, F> {
    /// 句柄版本是否等于资源的当前版本
    #[inline]
    pub fn is_valid(&self, handle: FgHandle) -> bool {
        self.registry.is_valid(handle)
    }

    /// 按名称查找资源的最新版本
    #[inline]
    pub fn find(&self, name: &str) -> Option<FgHandle> {
        self.registry.find(name)
    }

    /// 资源的当前版本
    #[inline]
    pub fn version(&self, handle: FgHandle) -> Option<u32> {
        self.registry.get(handle.resource).map(|entry| entry.version())
    }

    /// 获取物理资源
    ///
    /// 执行结束后只有导出和导入的资源仍然存在。
    #[inline]
    pub fn resource(&self, handle: FgHandle) -> Option<&F::Resource> {
        self.registry.get(handle.resource)?.resource()
    }

    #[inline]
    pub fn factory(&self) -> &F {
        &self.factory
    }

    #[inline]
    pub fn factory_mut(&mut self) -> &mut F {
        &mut self.factory
    }

    #[inline]
    pub fn settings(&self) -> &FgSettings {
        &self.settings
    }

    #[inline]
    pub fn registry(&self) -> &FgResourceRegistry<F> {
        &self.registry
    }

    #[inline]
    pub fn is_compiled(&self) -> bool {
        self.state == FgGraphState::Compiled
    }

    #[inline]
    pub fn is_executed(&self) -> bool {
        self.state == FgGraphState::Executed
    }

    /// 最近一次 `compile()` 失败的原因
    #[inline]
    pub fn last_compile_error(&self) -> Option<&FgCompileError> {
        self.last_compile_error.as_ref()
    }

    /// 编译后的执行顺序，未编译时为空
    #[inline]
    pub fn execution_order(&self) -> &[FgPassId] {
        &self.execution_order
    }

    #[inline]
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    #[inline]
    pub fn resource_count(&self) -> usize {
        self.registry.len()
    }

    #[inline]
    pub fn pass(&self, id: FgPassId) -> Option<&FgPassNode> {
        self.passes.get(id.index())
    }

    #[inline]
    pub fn pass_name(&self, id: FgPassId) -> Option<&str> {
        self.pass(id).map(|pass| pass.name())
    }

    /// Pass 是否在最近一次编译中存活
    #[inline]
    pub fn can_execute(&self, id: FgPassId) -> bool {
        self.pass(id).is_some_and(|pass| pass.can_execute())
    }

    /// setup 阶段填充的 Pass 数据，类型不匹配时返回 `None`
    pub fn pass_data<D: 'static>(&self, id: FgPassId) -> Option<&D> {
        self.executors.get(id.index())?.data().downcast_ref::<D>()
    }

    /// 资源条目的存活区间，没有存活 Pass 使用它时返回 `None`
    #[inline]
    pub fn lifetime(&self, handle: FgHandle) -> Option<FgLifetime> {
        self.lifetimes.get(handle.resource).copied()
    }
}

// debug
impl<'a, F: FgResourceFactory> FrameGraph<'a, F> {
    /// 打印执行计划（用于调试）
    pub fn print_execution_plan(&self) {
        if self.state == FgGraphState::Building {
            log::warn!("FrameGraph: print_execution_plan() called before a successful compile()");
            return;
        }

        log::info!("╔══════════════════════════════════════════════════════════════════╗");
        log::info!("║              FrameGraph Execution Plan                           ║");
        log::info!("╠══════════════════════════════════════════════════════════════════╣");
        log::info!(
            "║ Total Passes: {}  |  Culled: {}  |  Resources: {}",
            self.passes.len(),
            self.passes.len() - self.execution_order.len(),
            self.registry.len()
        );
        log::info!(
            "║ Execution Order: [{}]",
            self.execution_order
                .iter()
                .map(|id| self.passes[id.index()].name.as_str())
                .collect::<Vec<_>>()
                .join(" → ")
        );
        log::info!("╚══════════════════════════════════════════════════════════════════╝");

        for (index, &id) in self.execution_order.iter().enumerate() {
            let pass = &self.passes[id.index()];

            log::info!("");
            log::info!("┌─────────────────────────────────────────────────────────────────┐");
            log::info!(
                "│ [{}/{}] Pass: \"{}\"{}",
                index + 1,
                self.execution_order.len(),
                pass.name,
                if pass.side_effect { " (side effect)" } else { "" }
            );
            log::info!("├─────────────────────────────────────────────────────────────────┤");

            for (label, icon, handles) in [
                ("Creates", "✨", self.handle_labels(pass.creates())),
                ("Reads", "📖", self.handle_labels(pass.reads())),
                ("Writes", "✏️ ", self.handle_labels(pass.writes())),
            ] {
                if handles.is_empty() {
                    continue;
                }
                log::info!("│ {}:", label);
                for handle in handles {
                    log::info!("│   {} {}", icon, handle);
                }
            }

            let construct = &self.construct_at[index];
            let destroy = &self.destroy_at[index];
            if !construct.is_empty() || !destroy.is_empty() {
                log::info!("│ Lifetime:");
                for &resource in construct {
                    log::info!("│   🟢 construct \"{}\"", self.registry.name(resource));
                }
                for &resource in destroy {
                    log::info!("│   🔴 destroy \"{}\"", self.registry.name(resource));
                }
            }

            log::info!("└─────────────────────────────────────────────────────────────────┘");
        }

        let culled: Vec<&str> =
            self.passes.iter().filter(|pass| !pass.can_execute()).map(|pass| pass.name.as_str()).collect();
        if !culled.is_empty() {
            log::info!("");
            log::info!("Culled passes: [{}]", culled.join(", "));
        }
        if !self.exports.is_empty() {
            log::info!("Exported: [{}]", self.handle_labels(self.exports.iter().copied()).join(", "));
        }
    }

    fn handle_labels(&self, handles: impl Iterator<Item = FgHandle>) -> Vec<String> {
        handles.map(|h| format!("\"{}\" v{}", self.registry.name(h.resource), h.version)).collect()
    }
}
