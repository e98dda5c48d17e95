//! 有界性分析：无界判定、穷举模拟与路径重建.

pub mod boundedness;
pub mod path;
pub mod simulation;

pub use boundedness::BoundednessAnalyzer;
pub use path::PathFinder;
pub use simulation::{SimulationEngine, Verdict, Witness, fire_and_record};
