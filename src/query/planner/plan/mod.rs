// Plan DAG model: arena-owned nodes, control-flow constructors and the
// executable plan wrapper with its EXPLAIN description.

pub mod execution_plan;
pub mod logic;
pub mod node;
pub mod query;

pub use execution_plan::{
    BranchInfo, ExecutionPlan, PlanDescription, PlanNodeDescription, ProfileStats,
};
pub use node::{NodeBody, NodeId, PlanArena, PlanNode, PlanNodeKind, ProjectColumn};
