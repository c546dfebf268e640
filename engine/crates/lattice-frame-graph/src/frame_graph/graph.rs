//! 依赖图构建和拓扑排序
//!
//! 节点为存活的 Pass，边表示"前者必须先于后者执行"。
//! 使用 petgraph 的 DiGraph 存储，排序时按声明顺序打破平局。

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

use super::handle::{FgHandle, FgPassId};

/// 依赖边数据：产生这条依赖的资源句柄
#[derive(Clone, Debug, Default)]
pub struct FgEdgeData {
    pub resources: Vec<FgHandle>,
}

/// Pass 依赖图
pub struct FgDependencyGraph {
    /// 有向图：节点存储 Pass id，边存储资源依赖
    graph: DiGraph<FgPassId, FgEdgeData>,
    /// Pass id 到图节点的映射
    node_indices: HashMap<FgPassId, NodeIndex>,
}

impl FgDependencyGraph {
    /// 为给定的 Pass 创建只有节点、没有边的依赖图
    pub fn new(passes: impl IntoIterator<Item = FgPassId>) -> Self {
        let mut graph = DiGraph::new();
        let node_indices = passes.into_iter().map(|pass| (pass, graph.add_node(pass))).collect();
        Self { graph, node_indices }
    }

    /// 添加依赖边
    ///
    /// 已存在的边会合并资源列表；自环以及不在图中的 Pass 会被忽略。
    ///
    /// # 参数
    /// - `before`: 先执行的 Pass
    /// - `after`: 后执行的 Pass
    /// - `resource`: 产生依赖的资源句柄
    pub fn add_edge(&mut self, before: FgPassId, after: FgPassId, resource: FgHandle) {
        if before == after {
            return;
        }
        let (Some(&from), Some(&to)) = (self.node_indices.get(&before), self.node_indices.get(&after)) else {
            return;
        };

        if let Some(edge_idx) = self.graph.find_edge(from, to) {
            let edge_data = &mut self.graph[edge_idx];
            if !edge_data.resources.contains(&resource) {
                edge_data.resources.push(resource);
            }
        } else {
            self.graph.add_edge(from, to, FgEdgeData { resources: vec![resource] });
        }
    }

    /// 执行拓扑排序
    ///
    /// Kahn 算法，就绪集合用小顶堆维护，多个 Pass 同时就绪时先执行声明较早的。
    ///
    /// # 返回
    /// - `Ok(order)`: 排序后的 Pass 列表
    /// - `Err(cycle)`: 存在循环依赖，返回处于环上的 Pass（升序）
    pub fn topological_sort(&self) -> Result<Vec<FgPassId>, Vec<FgPassId>> {
        let mut in_degrees: Vec<usize> = self
            .graph
            .node_indices()
            .map(|node| self.graph.neighbors_directed(node, Direction::Incoming).count())
            .collect();

        let mut ready: BinaryHeap<Reverse<(FgPassId, NodeIndex)>> = self
            .graph
            .node_indices()
            .filter(|node| in_degrees[node.index()] == 0)
            .map(|node| Reverse((self.graph[node], node)))
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(Reverse((pass, node))) = ready.pop() {
            order.push(pass);

            for next in self.graph.neighbors_directed(node, Direction::Outgoing) {
                in_degrees[next.index()] -= 1;
                if in_degrees[next.index()] == 0 {
                    ready.push(Reverse((self.graph[next], next)));
                }
            }
        }

        if order.len() == self.graph.node_count() {
            Ok(order)
        } else {
            Err(self.find_cycle())
        }
    }

    /// 找出所有处于环上的 Pass
    fn find_cycle(&self) -> Vec<FgPassId> {
        let mut cycle: Vec<FgPassId> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1)
            .flatten()
            .map(|node| self.graph[node])
            .collect();
        cycle.sort();
        cycle
    }

    /// 获取 Pass 的直接依赖（前驱）
    pub fn predecessors(&self, pass: FgPassId) -> Vec<FgPassId> {
        self.neighbors(pass, Direction::Incoming)
    }

    /// 获取 Pass 的直接后继
    pub fn successors(&self, pass: FgPassId) -> Vec<FgPassId> {
        self.neighbors(pass, Direction::Outgoing)
    }

    fn neighbors(&self, pass: FgPassId, dir: Direction) -> Vec<FgPassId> {
        let Some(&node) = self.node_indices.get(&pass) else {
            return Vec::new();
        };
        let mut passes: Vec<FgPassId> = self.graph.neighbors_directed(node, dir).map(|n| self.graph[n]).collect();
        passes.sort();
        passes
    }

    /// 获取两个 Pass 之间的边
    pub fn edge(&self, before: FgPassId, after: FgPassId) -> Option<&FgEdgeData> {
        let from = *self.node_indices.get(&before)?;
        let to = *self.node_indices.get(&after)?;
        self.graph.find_edge(from, to).map(|edge| &self.graph[edge])
    }

    #[inline]
    pub fn pass_count(&self) -> usize {
        self.graph.node_count()
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}
