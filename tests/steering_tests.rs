mod common;

use common::CELL_SIZE;
use sentinel_nav::geometry::bearing;
use sentinel_nav::{Agent, AgentConfig, Grid, GridModel, NavError, Point, SteeringMode};
use std::collections::HashSet;

fn agent_with_step(position: Point, heading: f32, angular_step: f32) -> Agent {
    let mut config = AgentConfig::default();
    config.steering.angular_step = angular_step;
    config.steering.initial_heading = heading;
    Agent::seeded(1, position, Vec::new(), config, 42)
}

#[test]
fn test_heading_converges_within_bound() {
    let grid = Grid::new(30, 30, CELL_SIZE);
    let origin = Point::new(310.0, 310.0);

    for &step in &[1.0_f32, 2.5, 5.0, 7.0, 10.0, 45.0, 90.0, 200.0] {
        let bound = (180.0 / step).ceil() as usize;
        for heading in (0..360).step_by(15) {
            for target_bearing in (0..360).step_by(20) {
                let target = origin.advanced(target_bearing as f32, 150.0);
                let mut agent = agent_with_step(origin, heading as f32, step);
                agent.follow(&grid, vec![target]);
                assert_eq!(agent.mode(), SteeringMode::Rotating);

                let mut ticks = 0;
                while agent.mode() == SteeringMode::Rotating {
                    agent.tick(&grid).unwrap();
                    ticks += 1;
                    assert!(
                        ticks <= bound,
                        "step {} heading {} bearing {}: still rotating after {} ticks",
                        step,
                        heading,
                        target_bearing,
                        ticks
                    );
                }
                assert_eq!(agent.mode(), SteeringMode::Advancing);
                assert_eq!(agent.position, origin, "no movement while rotating");
            }
        }
    }
}

#[test]
fn test_due_north_bearing() {
    println!("\n=== Waypoint straight up the screen ===");

    let from = Point::new(10.0, 10.0);
    let to = Point::new(10.0, 0.0);
    assert!((bearing(from, to) - 90.0).abs() < 1e-4);

    // Far enough apart that the waypoint lies in another cell
    let grid = Grid::new(4, 4, CELL_SIZE);
    let from = Point::new(50.0, 70.0);
    let mut agent = agent_with_step(from, 0.0, 10.0);
    agent.follow(&grid, vec![Point::new(50.0, 30.0)]);
    while agent.mode() == SteeringMode::Rotating {
        agent.tick(&grid).unwrap();
    }
    agent.tick(&grid).unwrap();
    assert!((agent.heading - 90.0).abs() < 1e-4);
    assert!((agent.position.x - 50.0).abs() < 1e-4);
    assert!((agent.position.y - 69.5).abs() < 1e-4, "moved up by the default speed");
}

#[test]
fn test_one_waypoint_skipped_per_tick() {
    let grid = Grid::new(20, 20, CELL_SIZE);
    let mut agent = agent_with_step(Point::new(200.0, 200.0), 0.0, 5.0);

    // Close point straight ahead, then a U-turn through two points behind
    let first = Point::new(202.0, 200.0);
    let behind_near = Point::new(150.0, 200.0);
    let behind_far = Point::new(140.0, 200.0);
    let ahead = Point::new(300.0, 200.0);
    agent.follow(&grid, vec![first, behind_near, behind_far, ahead]);

    agent.tick(&grid).unwrap();
    assert_eq!(agent.mode(), SteeringMode::Advancing);
    for _ in 0..2 {
        agent.tick(&grid).unwrap();
        assert_eq!(agent.waypoint(), Some(first));
    }
    assert!((agent.position.x - 201.0).abs() < 1e-4);

    // Reaches `first`, then skips only `behind_near` even though
    // `behind_far` is just as far off the heading
    agent.tick(&grid).unwrap();
    assert_eq!(agent.waypoint(), Some(behind_far));
    assert!((agent.heading - 180.0).abs() < 1e-3);
    assert!((agent.position.x - 200.5).abs() < 1e-4);
}

#[test]
fn test_last_waypoint_is_never_skipped() {
    let grid = Grid::new(20, 20, CELL_SIZE);
    let mut config = AgentConfig::default();
    config.steering.initial_heading = 0.0;
    config.steering.speed = 3.0;
    let mut agent = Agent::seeded(1, Point::new(200.0, 200.0), Vec::new(), config, 9);

    let first = Point::new(203.0, 200.0);
    let behind = Point::new(150.0, 200.0);
    agent.follow(&grid, vec![first, behind]);

    agent.tick(&grid).unwrap();
    agent.tick(&grid).unwrap();
    assert_eq!(agent.position, first, "movement stops on the waypoint");

    agent.tick(&grid).unwrap();
    assert_eq!(agent.waypoint(), Some(behind));
    assert!((agent.heading - 180.0).abs() < 1e-3);
    assert!((agent.position.x - 200.0).abs() < 1e-3);
}

#[test]
fn test_patrol_keeps_replanning() {
    println!("\n=== Seeded patrol ===");

    let layout = "
        ............
        ............
        ...####.....
        ......#.....
        ......#..##.
        ..#.........
        ..#.........
        ..#...####..
        ............
        ............
    ";
    let grid = Grid::from_layout(layout, CELL_SIZE).unwrap();

    for seed in 0..5 {
        let mut config = AgentConfig::default();
        config.steering.speed = 2.0;
        config.steering.angular_step = 10.0;
        let mut agent = Agent::seeded(1, grid.center_of(0, 0), Vec::new(), config, seed);

        let mut goals = HashSet::new();
        let mut plans = 0;
        let mut last_goal = None;
        for tick in 0..3000 {
            let state = agent.tick(&grid).unwrap_or_else(|e| panic!("seed {} tick {}: {}", seed, tick, e));
            assert!(grid.node_at(state.position).is_some(), "seed {} left the grid", seed);

            let goal = agent.goal().map(|g| g.index());
            if goal != last_goal {
                plans += 1;
                last_goal = goal;
            }
            if let Some(goal) = goal {
                goals.insert(goal);
            }
        }

        println!("seed {}: {} plans, {} distinct goals", seed, plans, goals.len());
        assert!(plans >= 5, "seed {} only planned {} times", seed, plans);
    }
}

#[test]
fn test_plan_ends_on_goal_center() {
    let grid = Grid::from_layout(
        "
        ..........
        ....##....
        ....##....
        ..........
        ",
        CELL_SIZE,
    )
    .unwrap();
    let mut agent = Agent::seeded(4, grid.center_of(0, 0), Vec::new(), AgentConfig::default(), 17);

    let mut planned = 0;
    for _ in 0..20 {
        let waypoints = match agent.plan(&grid) {
            Ok(waypoints) => waypoints.clone(),
            // Drew the agent's own cell as goal
            Err(NavError::InsufficientPathPoints { count: 1 }) => continue,
            Err(e) => panic!("unexpected error {}", e),
        };
        planned += 1;
        let goal = agent.goal().unwrap().clone();
        assert!(!goal.barrier);
        assert_eq!(*waypoints.back().unwrap(), goal.center);
        assert_eq!(agent.mode(), SteeringMode::Rotating);
    }
    assert!(planned > 10);
}
