//! Rapier world setup and the scene query surface used by grappling and grounding.
#![forbid(unsafe_code)]

use rapier3d::prelude::*;

/// Stable identifier of a gameplay actor attached to one or more colliders.
///
/// Stored in the collider's `user_data` as `index + 1`, so `0` always means
/// "collider without an actor".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ActorId(pub u32);

impl ActorId {
    fn to_user_data(self) -> u128 {
        u128::from(self.0) + 1
    }

    fn from_user_data(data: u128) -> Option<Self> {
        if data == 0 {
            return None;
        }
        u32::try_from(data - 1).ok().map(ActorId)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SceneActor {
    pub name: String,
    pub grappleable: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct RayHit {
    pub point: Point<Real>,
    pub distance: Real,
    pub actor: Option<ActorId>,
}

/// Ray and actor queries against a static scene.
pub trait SceneQuery {
    /// Closest hit along `direction` within `max_distance`. `direction` need not be unit.
    fn raycast(
        &self,
        origin: Point<Real>,
        direction: Vector<Real>,
        max_distance: Real,
    ) -> Option<RayHit>;

    fn actor(&self, id: ActorId) -> Option<&SceneActor>;

    /// Existence-only hit test.
    fn raycast_short(
        &self,
        origin: Point<Real>,
        direction: Vector<Real>,
        max_distance: Real,
    ) -> bool {
        self.raycast(origin, direction, max_distance).is_some()
    }

    fn is_grappleable(&self, id: ActorId) -> bool {
        self.actor(id).is_some_and(|actor| actor.grappleable)
    }
}

pub struct PhysicsWorld {
    pub gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: BroadPhaseMultiSap,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
    actors: Vec<SceneActor>,
}

impl PhysicsWorld {
    pub fn new(gravity: Vector<Real>) -> Self {
        Self {
            gravity,
            integration_parameters: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhaseMultiSap::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            actors: Vec::new(),
        }
    }

    pub fn bodies(&self) -> &RigidBodySet {
        &self.bodies
    }

    pub fn colliders(&self) -> &ColliderSet {
        &self.colliders
    }

    pub fn query_pipeline(&self) -> &QueryPipeline {
        &self.query_pipeline
    }

    pub fn actors(&self) -> &[SceneActor] {
        &self.actors
    }

    pub fn step(&mut self, dt: Real) {
        self.integration_parameters.dt = dt;
        let physics_hooks = ();
        let event_handler = ();
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &physics_hooks,
            &event_handler,
        );
        self.query_pipeline.update(&self.colliders);
    }

    /// Makes colliders inserted since the last step visible to ray casts.
    pub fn refresh_queries(&mut self) {
        self.query_pipeline.update(&self.colliders);
    }

    pub fn insert_static_collider(&mut self, collider: Collider) -> ColliderHandle {
        self.colliders.insert(collider)
    }

    /// Registers `actor` and inserts `collider` tagged with the new id.
    pub fn insert_actor_collider(
        &mut self,
        mut collider: Collider,
        actor: SceneActor,
    ) -> (ColliderHandle, ActorId) {
        let id = ActorId(self.actors.len() as u32);
        self.actors.push(actor);
        collider.user_data = id.to_user_data();
        (self.colliders.insert(collider), id)
    }

    pub fn actor_of(&self, handle: ColliderHandle) -> Option<ActorId> {
        self.colliders
            .get(handle)
            .and_then(|collider| ActorId::from_user_data(collider.user_data))
    }
}

impl SceneQuery for PhysicsWorld {
    fn raycast(
        &self,
        origin: Point<Real>,
        direction: Vector<Real>,
        max_distance: Real,
    ) -> Option<RayHit> {
        let length = direction.norm();
        if length <= 1.0e-6 || max_distance <= 0.0 {
            return None;
        }
        let ray = Ray::new(origin, direction / length);
        let (handle, toi) = self.query_pipeline.cast_ray(
            &self.bodies,
            &self.colliders,
            &ray,
            max_distance,
            true,
            QueryFilter::default(),
        )?;
        Some(RayHit {
            point: ray.point_at(toi),
            distance: toi,
            actor: self.actor_of(handle),
        })
    }

    fn actor(&self, id: ActorId) -> Option<&SceneActor> {
        self.actors.get(id.0 as usize)
    }
}
