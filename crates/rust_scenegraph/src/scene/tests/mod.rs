//! Scene-level scenarios: hierarchy edits, drawing, animation and the text
//! format working together.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use approx::assert_relative_eq;

use super::*;
use crate::core::config::{SceneConfig, SlotConfig};
use crate::culling::Frustum;
use crate::foundation::math::{Mat3, Transform, Vec3};
use crate::render::{
    AnimationClip, AnimationList, AssetError, AssetLoader, BoneInfo, Camera, Color, DrawRecorder,
    Material, Mesh, Model,
};

const EPSILON: f32 = 1e-5;

/// Asset loader serving in-memory resources and recording requests
#[derive(Default)]
struct MemoryAssets {
    models: HashMap<String, Model>,
    animations: HashMap<String, AnimationList>,
    requests: Vec<String>,
}

impl AssetLoader for MemoryAssets {
    fn load_model(&mut self, path: &str) -> Result<Model, AssetError> {
        self.requests.push(path.to_string());
        self.models
            .get(path)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(path.to_string()))
    }

    fn load_animations(&mut self, path: &str) -> Result<AnimationList, AssetError> {
        self.requests.push(path.to_string());
        self.animations
            .get(path)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(path.to_string()))
    }
}

fn knight() -> Model {
    Model::from_meshes(vec![Mesh::cube("knight", 1.0)]).with_skeleton(
        vec![
            BoneInfo {
                name: "spine".to_string(),
                parent: None,
            },
            BoneInfo {
                name: "hand".to_string(),
                parent: Some(0),
            },
        ],
        vec![
            Transform::identity(),
            Transform::from_position(Vec3::new(0.4, 1.2, 0.0)),
        ],
    )
}

fn assets() -> MemoryAssets {
    let mut assets = MemoryAssets::default();
    let mut tower = Model::from_meshes(vec![Mesh::cube("tower", 4.0)]);
    tower.materials[0] = Material::new(Color::new(200, 200, 200, 255));
    assets.models.insert("tower.obj".to_string(), tower);
    assets.models.insert("knight.iqm".to_string(), knight());
    assets.animations.insert(
        "knight.iqm".to_string(),
        AnimationList::new(vec![AnimationClip::new(
            "wave",
            vec![vec![Transform::identity(); 2]; 4],
        )]),
    );
    assets
}

const CASTLE: &str = r#"
; A tower guarded by a knight
[SCENE "castle"]
[MODEL 0 "tower.obj"]
[MODEL 1 "knight.iqm"]
[ANIMS 0 "knight.iqm"]

[NODE 0 "tower"]
position = 10 0 -20
tint = 255 0 0 255
model = 0

[NODE 1 "knight"]
position = 1 2 3
scale = 2 2 2
rotation = 0 -1 0 1 0 0 0 0 1
model = 1
anims = 0

[NODE 2 "sword"]
position = 0.5 0 0

[NODE 3 "tower_low"]
model = 0

[NodeAttachChild 0 1]
[NodeAttachChildToBone 1 2 "hand"]
[NodeInsertLOD 0 3 100]
"#;

fn load(text: &str) -> Result<Scene, SceneFormatError> {
    Scene::load_str(text, &mut assets())
}

#[test]
fn test_load_builds_hierarchy() {
    let mut assets = assets();
    let scene = Scene::load_str(CASTLE, &mut assets).unwrap();
    let tree = scene.tree();

    assert_eq!(scene.name(), "castle");
    assert_eq!(scene.node_count(), 4);
    assert_eq!(scene.models().len(), 2);
    assert_eq!(assets.requests, vec!["tower.obj", "knight.iqm", "knight.iqm"]);

    let tower = scene.find_node("tower").unwrap();
    let knight = scene.find_node("knight").unwrap();
    let sword = scene.find_node("sword").unwrap();
    let low = scene.find_node("tower_low").unwrap();

    assert_eq!(tree.node(tower).unwrap().parent(), Some(scene.root()));
    assert_eq!(tree.node(knight).unwrap().parent(), Some(tower));
    assert_eq!(tree.node(sword).unwrap().parent(), Some(knight));
    assert!(tree.node(low).unwrap().parent().is_none());

    assert_eq!(tree.node(tower).unwrap().tint, Color::new(255, 0, 0, 255));
    assert_eq!(tree.node(tower).unwrap().next_lod(), Some(low));
    assert_eq!(tree.node(tower).unwrap().next_distance(), 100.0);
    assert_eq!(tree.node(sword).unwrap().bone_binding().unwrap().name, "hand");
    assert_eq!(tree.node(knight).unwrap().animations(), scene.animations_at(0));
}

#[test]
fn test_load_keeps_local_components() {
    let scene = load(CASTLE).unwrap();
    let tree = scene.tree();
    let knight = tree.node(scene.find_node("knight").unwrap()).unwrap();
    let sword = tree.node(scene.find_node("sword").unwrap()).unwrap();

    assert_eq!(knight.local.position, Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(knight.local.scale, Vec3::new(2.0, 2.0, 2.0));
    assert_eq!(
        knight.local.rotation,
        Mat3::new(0.0, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0)
    );
    assert_eq!(sword.local.position, Vec3::new(0.5, 0.0, 0.0));

    // World matrices are refreshed after loading
    assert_relative_eq!(knight.world_position(), Vec3::new(11.0, 2.0, -17.0), epsilon = EPSILON);
    // Sword: knight rotates +X onto +Y and scales by 2
    assert_relative_eq!(sword.world_position(), Vec3::new(11.0, 3.0, -17.0), epsilon = EPSILON);
}

#[test]
fn test_save_load_save_is_stable() {
    let scene = load(CASTLE).unwrap();
    let saved = scene.save_string();

    let reloaded = load(&saved).unwrap();
    assert_eq!(reloaded.save_string(), saved);

    for index in 0..scene.node_count() {
        let original = scene.tree().node(scene.node_at(index).unwrap()).unwrap();
        let copy = reloaded.tree().node(reloaded.node_at(index).unwrap()).unwrap();
        assert_eq!(original.name(), copy.name());
        assert_eq!(original.local, copy.local);
        assert_eq!(original.tint, copy.tint);
    }
}

#[test]
fn test_save_preserves_child_order() {
    let mut scene = Scene::new("order");
    let parent = scene.add_node("parent").unwrap();
    let children: Vec<_> = (0..3)
        .map(|i| scene.add_node(&format!("child{i}")).unwrap())
        .collect();
    for &child in &children {
        scene.tree_mut().attach_child(parent, child);
    }

    let reloaded = load(&scene.save_string()).unwrap();
    let names = |scene: &Scene| -> Vec<String> {
        let parent = scene.find_node("parent").unwrap();
        scene
            .tree()
            .children(parent)
            .map(|id| scene.tree().node(id).unwrap().name().to_string())
            .collect()
    };
    assert_eq!(names(&reloaded), names(&scene));
    assert_eq!(names(&scene), vec!["child2", "child1", "child0"]);
}

#[test]
fn test_warnings_do_not_abort() {
    let text = r#"
[SCENE "lenient"]
stray = 1
[NODE 0 "a"]
colour = red
position = 1 2
model = 7
anims = x
tint = 1 2 3 4
this line has no equals sign
"#;
    let scene = load(text).unwrap();
    let node = scene.tree().node(scene.node_at(0).unwrap()).unwrap();
    assert_eq!(node.local.position, Vec3::zeros());
    assert_eq!(node.tint, Color::new(1, 2, 3, 4));
    assert!(node.model().is_none());
    assert!(node.animations().is_none());
}

#[test]
fn test_unknown_bone_is_a_warning() {
    let text = r#"
[SCENE "s"]
[MODEL 0 "knight.iqm"]
[NODE 0 "knight"]
model = 0
[NODE 1 "hat"]
[NodeAttachChildToBone 0 1 "head"]
"#;
    let scene = load(text).unwrap();
    let hat = scene.tree().node(scene.node_at(1).unwrap()).unwrap();
    assert_eq!(hat.parent(), scene.node_at(0));
    assert!(hat.bone_binding().is_none());
}

#[test]
fn test_bone_seed_survives_load_without_position() {
    let text = r#"
[SCENE "s"]
[MODEL 0 "knight.iqm"]
[NODE 0 "knight"]
model = 0
[NODE 1 "sword"]
scale = 2 2 2
[NodeAttachChildToBone 0 1 "hand"]
"#;
    let scene = load(text).unwrap();
    let sword = scene.tree().node(scene.node_at(1).unwrap()).unwrap();
    assert_eq!(sword.bone_binding().unwrap().name, "hand");
    assert_relative_eq!(sword.local.position, Vec3::new(0.4, 1.2, 0.0), epsilon = EPSILON);
    assert_relative_eq!(sword.local.scale, Vec3::new(2.0, 2.0, 2.0), epsilon = EPSILON);

    // Saving writes the seeded position back out
    let reloaded = load(&scene.save_string()).unwrap();
    let sword = reloaded.tree().node(reloaded.node_at(1).unwrap()).unwrap();
    assert_relative_eq!(sword.local.position, Vec3::new(0.4, 1.2, 0.0), epsilon = EPSILON);
}

#[test]
fn test_bracketed_and_multiline_names_reload() {
    let mut scene = Scene::new("keep [this]");
    scene.add_node("crate[1]").unwrap();
    scene.add_node("two\nlines").unwrap();

    let reloaded = load(&scene.save_string()).unwrap();
    assert_eq!(reloaded.name(), "keep [this]");
    assert!(reloaded.find_node("crate[1]").is_some());
    assert!(reloaded.find_node("two lines").is_some());
}

#[test]
fn test_detached_nodes_stay_detached() {
    let mut scene = Scene::new("loose");
    let removed = scene.add_node("removed").unwrap();
    scene.add_node("kept").unwrap();
    let branch = scene.add_node("branch").unwrap();
    let leaf = scene.add_node("leaf").unwrap();
    let tree = scene.tree_mut();
    tree.attach_child(branch, leaf);
    tree.remove(removed);
    tree.detach_branch(branch);

    let reloaded = load(&scene.save_string()).unwrap();
    let root = reloaded.root();
    let tree = reloaded.tree();
    let node = |index| tree.node(reloaded.node_at(index).unwrap()).unwrap();

    assert!(node(0).parent().is_none());
    assert_eq!(node(1).parent(), Some(root));
    assert!(node(2).parent().is_none());
    assert_eq!(node(3).parent(), reloaded.node_at(2));
    assert_eq!(tree.children(root).collect::<Vec<_>>(), vec![reloaded.node_at(1).unwrap()]);
}

#[test]
fn test_load_errors() {
    assert!(matches!(load(""), Err(SceneFormatError::MissingScene { .. })));
    assert!(matches!(
        load("[NODE 0 \"a\"]"),
        Err(SceneFormatError::MissingScene { line: 1 })
    ));
    assert!(matches!(
        load("[SCENE \"a\"]\n[SCENE \"b\"]"),
        Err(SceneFormatError::DuplicateScene { line: 2 })
    ));
    assert!(matches!(
        load("[SCENE \"s\"]\n[NODE 1 \"a\"]"),
        Err(SceneFormatError::IndexOrder {
            line: 2,
            expected: 0,
            found: 1,
            ..
        })
    ));
    assert!(matches!(
        load("[SCENE \"s\"]\n[NODE 0 \"a\"\n"),
        Err(SceneFormatError::UnterminatedSection { line: 2 })
    ));
    assert!(matches!(
        load("[SCENE \"s\"]\n[LIGHT 0]"),
        Err(SceneFormatError::UnknownSection { line: 2, .. })
    ));
    assert!(matches!(
        load("[SCENE \"s\"]\n[NODE 0 \"a\"]\n[NodeAttachChild 0 5]"),
        Err(SceneFormatError::UnknownNode { line: 3, index: 5 })
    ));
    assert!(matches!(
        load("[SCENE \"s\"]\n[NODE 0 \"a\"]\n[NodeAttachChild 0]"),
        Err(SceneFormatError::BadArguments { line: 3, .. })
    ));
    assert!(matches!(
        load("[SCENE \"s\"]\n[MODEL 0 \"missing.obj\"]"),
        Err(SceneFormatError::Asset { line: 2, .. })
    ));
}

#[test]
fn test_fixed_slots_abort_load() {
    let config = SceneConfig::default().with_slots(SlotConfig::fixed(1, 1, 1));
    let text = "[SCENE \"s\"]\n[NODE 0 \"a\"]\n[NODE 1 \"b\"]";
    let result = Scene::load_str_with_config(text, config, &mut assets());
    assert!(matches!(
        result,
        Err(SceneFormatError::SlotsExhausted {
            line: 3,
            kind: "node"
        })
    ));
}

#[test]
fn test_remove_flattens_one_level() {
    let mut scene = Scene::new("family");
    let a = scene.add_node("a").unwrap();
    let b = scene.add_node("b").unwrap();
    let c = scene.add_node("c").unwrap();
    let tree = scene.tree_mut();
    tree.attach_child(a, b);
    tree.attach_child(a, c);

    tree.remove(a);

    let root = scene.root();
    let children: Vec<_> = scene.tree().children(root).collect();
    assert_eq!(children, vec![c, b]);
    assert!(scene.tree().node(a).unwrap().parent().is_none());
}

#[test]
fn test_example_sphere_is_drawn() {
    let mut scene = Scene::new("frustum");
    let model = scene
        .add_model(Model::from_meshes(vec![Mesh::cube("ball", 1.0)]), "ball.obj")
        .unwrap();
    let ball = scene.add_model_node("ball", model).unwrap();
    let hidden = scene.add_model_node("hidden", model).unwrap();
    scene
        .tree_mut()
        .node_mut(ball)
        .unwrap()
        .set_position(Vec3::new(5.0, 3.0, -10.0));
    scene
        .tree_mut()
        .node_mut(hidden)
        .unwrap()
        .set_position(Vec3::new(40.0, 40.0, 40.0));
    scene.update();

    let camera = Camera::perspective(Vec3::new(10.0, 10.0, 10.0), Vec3::zeros(), 45.0);
    let frustum = Frustum::from_camera(&camera, 800.0 / 450.0).unwrap();
    let mut recorder = DrawRecorder::new();

    assert_eq!(scene.draw(&frustum, &mut recorder), 1);
    assert!(scene.tree().node(ball).unwrap().visibility().inside_frustum);
    assert!(!scene.tree().node(hidden).unwrap().visibility().inside_frustum);
    assert_eq!(recorder.draws[0].mesh, "ball");
}

#[test]
fn test_tint_and_lod_from_loaded_scene() {
    let mut scene = load(CASTLE).unwrap();
    let camera = Camera::perspective(Vec3::zeros(), Vec3::new(10.0, 0.0, -20.0), 60.0);
    let frustum = Frustum::from_camera(&camera, 1.0).unwrap();
    let mut recorder = DrawRecorder::new();

    scene.draw(&frustum, &mut recorder);

    let tower = scene.find_node("tower").unwrap();
    assert_eq!(scene.tree().node(tower).unwrap().active_lod(), Some(tower));
    let tower_draw = recorder
        .draws
        .iter()
        .find(|draw| draw.mesh == "tower")
        .unwrap();
    assert_eq!(tower_draw.color, Color::new(200, 0, 0, 255));

    // From further away the low-detail node takes over
    let far_camera = Camera::perspective(Vec3::new(0.0, 0.0, 200.0), Vec3::new(10.0, 0.0, -20.0), 60.0);
    let far_frustum = Frustum::from_camera(&far_camera, 1.0).unwrap();
    scene.draw(&far_frustum, &mut recorder);
    let low = scene.find_node("tower_low").unwrap();
    assert_eq!(scene.tree().node(tower).unwrap().active_lod(), Some(low));
}

#[test]
fn test_scene_animation_events() {
    let mut scene = load(CASTLE).unwrap();
    let knight = scene.find_node("knight").unwrap();
    let fired = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&fired);

    let tree = scene.tree_mut();
    tree.set_animation_event_handler(knight, move |_, _| *counter.borrow_mut() += 1);
    tree.set_animation_loops(knight, 2);
    assert!(tree.play_animation_name(knight, "wave"));

    let mut events = Vec::new();
    for _ in 0..6 {
        events.extend(scene.advance_animations(2.0));
        scene.update();
    }

    assert_eq!(
        events,
        vec![(knight, AnimationEvent::Loop), (knight, AnimationEvent::Complete)]
    );
    assert_eq!(*fired.borrow(), 2);
    assert_eq!(
        scene.tree().node(knight).unwrap().timeline.state(),
        PlaybackState::Stopped
    );
}
