use std::fmt::Write;

use bevy::log::LogPlugin;
use bevy::math::EulerRot;
use bevy::prelude::*;
use clap::Parser;
use tracing::warn;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use headwire::attitude::{progress, Attitude};
use headwire::overlay;
use headwire::session::TrackingSession;
use headwire::source::{open_source, AttitudeSource, SourceStatus};

/// Renders a wireframe head driven by a live head-orientation stream,
/// relative to the pose held when the stream started.
#[derive(Parser, Debug)]
#[command(name = "headwire", version, about)]
struct Args {
    /// Serial device (e.g. /dev/ttyUSB0) or recorded JSON-lines file
    #[arg(default_value = "samples/nod.jsonl")]
    source: String,

    /// Serial baud rate
    #[arg(long, default_value_t = 460_800)]
    baud: u32,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    let tracker = match open_source(&args.source, args.baud) {
        Ok(source) => HeadTracker::new(source),
        Err(e) => {
            warn!(error = %e, "running without motion tracking");
            HeadTracker::unavailable()
        }
    };

    App::new()
        .insert_resource(ClearColor(Color::BLACK))
        .insert_resource(tracker)
        .add_plugins(DefaultPlugins.build().disable::<LogPlugin>())
        .add_systems(Startup, setup)
        .add_systems(
            Update,
            (poll_source, update_head, update_bars, update_status).chain(),
        )
        .run();
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "headwire=debug" } else { "headwire=info" };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .init();
}

/// Owns the sample source and the session it feeds.
#[derive(Resource)]
struct HeadTracker {
    source: Option<Box<dyn AttitudeSource>>,
    session: TrackingSession,
    seen_generation: u64,
    status: SourceStatus,
}

impl HeadTracker {
    fn new(source: Box<dyn AttitudeSource>) -> HeadTracker {
        let mut session = TrackingSession::new();
        session.start();
        let seen_generation = source.generation();
        HeadTracker {
            source: Some(source),
            session,
            seen_generation,
            status: SourceStatus::Waiting,
        }
    }

    /// No motion capability on this machine; the scene still renders.
    fn unavailable() -> HeadTracker {
        HeadTracker {
            source: None,
            session: TrackingSession::new(),
            seen_generation: 0,
            status: SourceStatus::Offline,
        }
    }

    fn is_available(&self) -> bool {
        self.source.is_some()
    }

    fn poll(&mut self) {
        let Some(source) = self.source.as_mut() else {
            return;
        };
        self.status = source.tick();
        let generation = source.generation();
        if generation != self.seen_generation {
            self.seen_generation = generation;
            self.session.restart();
        }
        if let Some(sample) = source.latest() {
            self.session.ingest(sample);
        }
    }
}

#[derive(Component)]
struct HeadNode;

#[derive(Component)]
struct StatusText;

#[derive(Debug, Clone, Copy, Component)]
enum Axis {
    Roll,
    Pitch,
    Yaw,
}

impl Axis {
    fn label(self) -> &'static str {
        match self {
            Axis::Roll => "roll",
            Axis::Pitch => "pitch",
            Axis::Yaw => "yaw",
        }
    }

    fn pick(self, attitude: Attitude) -> f32 {
        match self {
            Axis::Roll => attitude.roll,
            Axis::Pitch => attitude.pitch,
            Axis::Yaw => attitude.yaw,
        }
    }
}

fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    tracker: Res<HeadTracker>,
) {
    // head
    commands.spawn((
        PbrBundle {
            mesh: meshes.add(overlay::head_mesh()),
            material: materials.add(StandardMaterial {
                base_color: Color::WHITE,
                unlit: true,
                ..default()
            }),
            ..default()
        },
        HeadNode,
    ));

    // camera
    commands.spawn(Camera3dBundle {
        projection: PerspectiveProjection {
            fov: overlay::CAMERA_FOV_DEG.to_radians(),
            ..default()
        }
        .into(),
        transform: overlay::camera_transform(),
        ..default()
    });

    if !tracker.is_available() {
        commands.spawn(
            TextBundle::from_section(
                "Your device doesn't support head motion tracking.",
                TextStyle {
                    font_size: 22.0,
                    color: Color::WHITE,
                    ..default()
                },
            )
            .with_style(Style {
                position_type: PositionType::Absolute,
                top: Val::Px(24.0),
                left: Val::Px(24.0),
                ..default()
            }),
        );
        return;
    }

    // one bar per axis along the top
    commands
        .spawn(NodeBundle {
            style: Style {
                position_type: PositionType::Absolute,
                top: Val::Px(16.0),
                left: Val::Px(16.0),
                right: Val::Px(16.0),
                flex_direction: FlexDirection::Column,
                row_gap: Val::Px(8.0),
                ..default()
            },
            ..default()
        })
        .with_children(|root| {
            for axis in [Axis::Roll, Axis::Pitch, Axis::Yaw] {
                root.spawn(NodeBundle {
                    style: Style {
                        flex_direction: FlexDirection::Row,
                        align_items: AlignItems::Center,
                        column_gap: Val::Px(8.0),
                        ..default()
                    },
                    ..default()
                })
                .with_children(|row| {
                    row.spawn(
                        TextBundle::from_section(
                            axis.label(),
                            TextStyle {
                                font_size: 16.0,
                                color: Color::WHITE,
                                ..default()
                            },
                        )
                        .with_style(Style {
                            width: Val::Px(48.0),
                            ..default()
                        }),
                    );
                    row.spawn(NodeBundle {
                        style: Style {
                            flex_grow: 1.0,
                            height: Val::Px(6.0),
                            ..default()
                        },
                        background_color: Color::rgb(0.2, 0.2, 0.2).into(),
                        ..default()
                    })
                    .with_children(|track| {
                        track.spawn((
                            NodeBundle {
                                style: Style {
                                    width: Val::Percent(50.0),
                                    height: Val::Percent(100.0),
                                    ..default()
                                },
                                background_color: Color::rgb(0.9, 0.9, 0.9).into(),
                                ..default()
                            },
                            axis,
                        ));
                    });
                });
            }
        });

    // status line, bottom right
    commands.spawn((
        TextBundle::from_section(
            "",
            TextStyle {
                font_size: 18.0,
                color: Color::WHITE,
                ..default()
            },
        )
        .with_style(Style {
            position_type: PositionType::Absolute,
            bottom: Val::Px(8.0),
            right: Val::Px(12.0),
            ..default()
        }),
        StatusText,
    ));
}

fn poll_source(mut tracker: ResMut<HeadTracker>) {
    tracker.poll();
}

fn update_head(tracker: Res<HeadTracker>, mut head: Query<&mut Transform, With<HeadNode>>) {
    let Ok(rotation) = tracker.session.display_rotation() else {
        return;
    };
    head.single_mut().rotation =
        Quat::from_euler(EulerRot::XYZ, rotation.pitch, rotation.yaw, rotation.roll);
}

/// Bars show the raw (uncalibrated) angles, mapped through `(a + 1) / 2`
/// and clamped only because a width cannot paint past 100%.
fn update_bars(tracker: Res<HeadTracker>, mut bars: Query<(&Axis, &mut Style)>) {
    let Some(raw) = tracker.session.latest() else {
        return;
    };
    for (axis, mut style) in &mut bars {
        let fraction = progress(axis.pick(raw)).clamp(0.0, 1.0);
        style.width = Val::Percent(fraction * 100.0);
    }
}

fn update_status(tracker: Res<HeadTracker>, mut text: Query<&mut Text, With<StatusText>>) {
    let Ok(mut text) = text.get_single_mut() else {
        return;
    };
    let value = &mut text.sections[0].value;
    value.clear();
    match tracker.status {
        SourceStatus::Offline => write!(value, "Offline").unwrap(),
        SourceStatus::Waiting => write!(value, "Waiting for first sample...").unwrap(),
        SourceStatus::Live(seconds) => write!(value, "Live {:.2}s", seconds).unwrap(),
    }
}
