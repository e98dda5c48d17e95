//! # P/T 网核心定义（Place/Transition Net）
//!
//! 设离散库所集合 `P` 与迁移集合 `T`。每条弧连接一个库所与一个迁移，
//! 平行弧在输入/输出矩阵 `Pre, Post ∈ ℕ^{|P|×|T|}` 中按重数累加。
//! 对任意标识 `M ∈ ℕ^{|P|}`：
//!
//! * 迁移 `t ∈ T` **激活** 当且仅当 `∀p ∈ P: Pre[p, t] > 0 ⟹ M[p] ≥ 1`；
//! * 激活的迁移 **发生** 后得到 `M' = (M ∸ Pre[:, t]) + Post[:, t]`，
//!   其中 `∸` 为饱和减法：库所的标记数永不为负；
//! * 发生之后立即重新计算所有迁移的激活状态，绝不延迟。
//!
//! 提供的核心 API 支持：
//! * 外部导入流（构造库所/迁移/弧、命名、定位、初始标记）；
//! * 激活集计算与单步发生、标识读写与回溯；
//! * 标识的分量偏序（支配判定的基础）；
//! * 状态快照与恢复（备忘录），JSON/RON 网定义文件.
//!
//! ## 示例
//!
//! ```rust
//! use pnbound::net::Net;
//!
//! let mut net = Net::new();
//! net.add_place("p1").unwrap();
//! net.add_transition("t1").unwrap();
//! net.add_arc("a1", "p1", "t1").unwrap();
//! net.init_place_tokens("p1", 1).unwrap();
//! net.check_all_transition_states();
//!
//! let active = net.active_transition_ids();
//! assert_eq!(active.len(), 1);
//!
//! let next = net.fire(active[0]).unwrap();
//! assert_eq!(next.tokens(net.place_id("p1").unwrap()), 0);
//! assert!(net.fire(active[0]).is_none());
//! ```

pub mod core;
pub mod ids;
pub mod incidence;
pub mod index_vec;
pub mod io;
pub mod structure;

pub use self::core::{Net, NetError, NetMemento};
pub use ids::{ArcId, EdgeId, NodeId, PlaceId, TransitionId};
pub use incidence::Incidence;
pub use index_vec::{Idx, IndexVec};
pub use structure::{Arc, ArcEndpoints, Marking, NetNode, Place, Position, Transition, Weight};
