use anyhow::{bail, Result};

use super::template::{InsertionPoint, RequestTemplate};
use super::AttackType;

/// A validated attack configuration: base template, strategy, insertion
/// points, and one payload list per point position.
///
/// Validation is fail-closed: construction rejects any plan that could
/// stall or error mid-attack, so enumeration never sends a partial run.
#[derive(Debug, Clone)]
pub struct AttackPlan {
    base: RequestTemplate,
    attack: AttackType,
    points: Vec<InsertionPoint>,
    payloads: Vec<Vec<String>>,
}

impl AttackPlan {
    pub fn new(
        base: RequestTemplate,
        attack: AttackType,
        points: Vec<InsertionPoint>,
        payloads: Vec<Vec<String>>,
    ) -> Result<Self> {
        if points.is_empty() {
            bail!("attack plan has no insertion points");
        }
        for point in &points {
            base.resolve(point)?;
        }
        for (i, a) in points.iter().enumerate() {
            for b in points.iter().skip(i + 1) {
                if let (Ok((sa, start_a, end_a)), Ok((sb, start_b, end_b))) =
                    (base.resolve(a), base.resolve(b))
                {
                    if sa == sb && start_a < end_b && start_b < end_a {
                        bail!(
                            "insertion points '{}' and '{}' overlap",
                            a.name,
                            b.name
                        );
                    }
                }
            }
        }
        let referenced = match attack {
            AttackType::BatteringRam => 1,
            _ => points.len(),
        };
        if payloads.len() < referenced {
            bail!(
                "{} attack needs {} payload lists, got {}",
                attack.name(),
                referenced,
                payloads.len()
            );
        }
        for (position, list) in payloads.iter().take(referenced).enumerate() {
            if list.is_empty() {
                bail!("payload list for position {position} is empty");
            }
        }
        Ok(Self {
            base,
            attack,
            points,
            payloads,
        })
    }

    pub fn attack_type(&self) -> AttackType {
        self.attack
    }

    pub fn points(&self) -> &[InsertionPoint] {
        &self.points
    }

    /// Total requests the plan will produce.
    pub fn request_count(&self) -> usize {
        match self.attack {
            AttackType::Sniper => self
                .payloads
                .iter()
                .take(self.points.len())
                .map(Vec::len)
                .sum(),
            AttackType::BatteringRam => self.payloads[0].len(),
            AttackType::Pitchfork => self
                .payloads
                .iter()
                .take(self.points.len())
                .map(Vec::len)
                .min()
                .unwrap_or(0),
            AttackType::ClusterBomb => self
                .payloads
                .iter()
                .take(self.points.len())
                .map(Vec::len)
                .product(),
        }
    }

    pub fn generate(&self) -> Generator<'_> {
        let state = match self.attack {
            AttackType::Sniper => State::Sniper { point: 0, index: 0 },
            AttackType::BatteringRam => State::Ram { index: 0 },
            AttackType::Pitchfork => State::Pitchfork { index: 0 },
            AttackType::ClusterBomb => State::Cluster {
                odometer: vec![0; self.points.len()],
                done: false,
            },
        };
        Generator { plan: self, state }
    }
}

enum State {
    Sniper { point: usize, index: usize },
    Ram { index: usize },
    Pitchfork { index: usize },
    Cluster { odometer: Vec<usize>, done: bool },
}

/// Lazy enumeration of mutated requests; no request is built until asked
/// for, so large cluster-bomb products cost nothing up front.
pub struct Generator<'p> {
    plan: &'p AttackPlan,
    state: State,
}

impl Iterator for Generator<'_> {
    type Item = Result<RequestTemplate>;

    fn next(&mut self) -> Option<Self::Item> {
        let plan = self.plan;
        match &mut self.state {
            State::Sniper { point, index } => loop {
                if *point >= plan.points.len() {
                    return None;
                }
                let list = &plan.payloads[*point];
                if *index >= list.len() {
                    *point += 1;
                    *index = 0;
                    continue;
                }
                let payload = &list[*index];
                *index += 1;
                return Some(plan.base.apply(&plan.points[*point], payload));
            },
            State::Ram { index } => {
                let list = &plan.payloads[0];
                if *index >= list.len() {
                    return None;
                }
                let payload = &list[*index];
                *index += 1;
                let assignments: Vec<_> = plan
                    .points
                    .iter()
                    .map(|p| (p, payload.as_str()))
                    .collect();
                Some(plan.base.apply_all(&assignments))
            }
            State::Pitchfork { index } => {
                let limit = plan
                    .payloads
                    .iter()
                    .take(plan.points.len())
                    .map(Vec::len)
                    .min()
                    .unwrap_or(0);
                if *index >= limit {
                    return None;
                }
                let i = *index;
                *index += 1;
                let assignments: Vec<_> = plan
                    .points
                    .iter()
                    .enumerate()
                    .map(|(pos, p)| (p, plan.payloads[pos][i].as_str()))
                    .collect();
                Some(plan.base.apply_all(&assignments))
            }
            State::Cluster { odometer, done } => {
                if *done {
                    return None;
                }
                let assignments: Vec<_> = plan
                    .points
                    .iter()
                    .enumerate()
                    .map(|(pos, p)| (p, plan.payloads[pos][odometer[pos]].as_str()))
                    .collect();
                let item = plan.base.apply_all(&assignments);
                // advance with the last point fastest
                let mut pos = odometer.len();
                loop {
                    if pos == 0 {
                        *done = true;
                        break;
                    }
                    pos -= 1;
                    odometer[pos] += 1;
                    if odometer[pos] < plan.payloads[pos].len() {
                        break;
                    }
                    odometer[pos] = 0;
                }
                Some(item)
            }
        }
    }
}
