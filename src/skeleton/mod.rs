pub mod cmu;
pub mod openpose;

pub use cmu::cmu;
pub use openpose::openpose;

use nalgebra::Vector3;
use std::collections::HashMap;

use crate::error::ConvertError;
use crate::math::RotationOrder;

/// 基底ルール内で参照する位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointRef {
    /// 名前で指定したジョイントのキーポイント
    Joint(&'static str),
    /// 自分自身のキーポイント
    Own,
    /// 最初の子のキーポイント
    Child,
    /// 実効親（キーポイントを持つ最も近い祖先）のキーポイント
    Parent,
}

/// 方向ベクトル指定: (a, b) は a - b を意味する
pub type DirSpec = (PointRef, PointRef);

/// ジョイントごとの基底構築ルール（静的テーブル用）
///
/// 解剖学的に意味のあるベクトル対からローカル座標軸を導く
/// ヒューリスティックをデータとして持つ。評価は単一の
/// 汎用インタプリタが行い、トラバースのアルゴリズムからは分離する。
#[derive(Debug, Clone, Copy)]
pub enum BasisSpec {
    /// 指定された軸方向から基底を構築（未指定軸はクロス積で補完）
    Axes {
        x: Option<DirSpec>,
        y: Option<DirSpec>,
        z: Option<DirSpec>,
        /// 再直交化の優先順（先頭の軸の方向を信頼する）
        priority: RotationOrder,
    },
    /// 親の姿勢をそのまま継承する（ローカル回転ゼロ）
    InheritParent,
}

/// 静的スケルトン定義の1ジョイント
///
/// トポロジーはコードではなくデータ。リグを差し替えても
/// オフセット推定・チャンネル変換のアルゴリズムには触れない。
#[derive(Debug, Clone, Copy)]
pub struct JointSpec {
    pub name: &'static str,
    /// ポーズ列のキーポイントインデックス。Noneは仮想ジョイント
    /// （ソースデータに対応点がなく、リグ構造のためだけに存在する）
    pub keypoint: Option<usize>,
    pub children: &'static [&'static str],
    /// レストポーズのボーン方向。向きのみ意味を持ち、大きさは無視される
    pub direction: [f32; 3],
    /// 回転チャンネルの順序。エンドサイトはNone
    pub order: Option<RotationOrder>,
    pub end_site: bool,
    pub basis: BasisSpec,
}

/// 解決済み基底ルール（キーポイントインデックス対）
#[derive(Debug, Clone)]
pub enum BasisRule {
    Axes {
        x: Option<(usize, usize)>,
        y: Option<(usize, usize)>,
        z: Option<(usize, usize)>,
        priority: RotationOrder,
    },
    InheritParent,
}

/// 解決済みジョイント
#[derive(Debug, Clone)]
pub struct Joint {
    pub name: &'static str,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub keypoint: Option<usize>,
    pub end_site: bool,
    pub direction: Vector3<f32>,
    pub order: Option<RotationOrder>,
    pub rule: BasisRule,
}

/// 出力リグを記述する静的な運動学ツリー
#[derive(Debug, Clone)]
pub struct Skeleton {
    variant: &'static str,
    joints: Vec<Joint>,
    root: usize,
    by_name: HashMap<&'static str, usize>,
}

impl Skeleton {
    /// 静的定義テーブルからスケルトンを構築する
    ///
    /// 検証する不変条件:
    /// - ルートはちょうど1つ（どの子リストにも現れないジョイント）
    /// - 各ジョイントの親は高々1つ、全ジョイントがルートから到達可能
    /// - エンドサイトは子と回転チャンネルを持たない
    /// - 非エンドサイトは回転チャンネル順序を持つ
    pub fn from_specs(variant: &'static str, specs: &[JointSpec]) -> Result<Self, ConvertError> {
        let mut by_name: HashMap<&'static str, usize> = HashMap::new();
        for (i, spec) in specs.iter().enumerate() {
            if by_name.insert(spec.name, i).is_some() {
                return Err(ConvertError::SkeletonDefinition(format!(
                    "duplicate joint name: {}",
                    spec.name
                )));
            }
        }

        // 親リンクの構築（子リストに2回現れたらエラー）
        let mut parent: Vec<Option<usize>> = vec![None; specs.len()];
        let mut has_parent = vec![false; specs.len()];
        for (i, spec) in specs.iter().enumerate() {
            for child_name in spec.children {
                let c = *by_name.get(child_name).ok_or_else(|| {
                    ConvertError::SkeletonDefinition(format!(
                        "unknown child joint: {}",
                        child_name
                    ))
                })?;
                if has_parent[c] {
                    return Err(ConvertError::SkeletonDefinition(format!(
                        "joint {} has multiple parents",
                        child_name
                    )));
                }
                has_parent[c] = true;
                parent[c] = Some(i);
            }
        }

        let roots: Vec<usize> = (0..specs.len()).filter(|&i| !has_parent[i]).collect();
        let root = match roots.as_slice() {
            [r] => *r,
            _ => {
                return Err(ConvertError::SkeletonDefinition(format!(
                    "expected exactly one root, found {}",
                    roots.len()
                )))
            }
        };

        // 到達可能性（親リンクが単一なのでサイクルはここで検出される）
        let mut visited = vec![false; specs.len()];
        let mut stack = vec![root];
        while let Some(i) = stack.pop() {
            if visited[i] {
                return Err(ConvertError::SkeletonDefinition(format!(
                    "joint {} visited twice (cycle?)",
                    specs[i].name
                )));
            }
            visited[i] = true;
            for child_name in specs[i].children {
                stack.push(by_name[child_name]);
            }
        }
        if let Some(i) = visited.iter().position(|&v| !v) {
            return Err(ConvertError::SkeletonDefinition(format!(
                "joint {} unreachable from root",
                specs[i].name
            )));
        }

        for spec in specs {
            if spec.end_site {
                if !spec.children.is_empty() {
                    return Err(ConvertError::SkeletonDefinition(format!(
                        "end site {} must not have children",
                        spec.name
                    )));
                }
                if spec.order.is_some() {
                    return Err(ConvertError::SkeletonDefinition(format!(
                        "end site {} must not have rotation channels",
                        spec.name
                    )));
                }
            } else if spec.order.is_none() {
                return Err(ConvertError::SkeletonDefinition(format!(
                    "joint {} is missing a rotation channel order",
                    spec.name
                )));
            }
        }

        // 実効キーポイント（仮想ジョイントは祖先へ委譲）を先に解決しておく
        // 親が先に処理されるよう行きがけ順で埋める
        let mut effective: Vec<Option<usize>> = vec![None; specs.len()];
        {
            let mut stack = vec![root];
            while let Some(i) = stack.pop() {
                effective[i] = specs[i]
                    .keypoint
                    .or_else(|| parent[i].and_then(|p| effective[p]));
                for child_name in specs[i].children.iter().rev() {
                    stack.push(by_name[child_name]);
                }
            }
        }

        let resolve_ref = |i: usize, r: PointRef| -> Result<usize, ConvertError> {
            let kp = match r {
                PointRef::Joint(name) => {
                    let j = *by_name.get(name).ok_or_else(|| {
                        ConvertError::SkeletonDefinition(format!(
                            "basis rule of {} references unknown joint {}",
                            specs[i].name, name
                        ))
                    })?;
                    specs[j].keypoint
                }
                PointRef::Own => specs[i].keypoint,
                PointRef::Child => specs[i]
                    .children
                    .first()
                    .and_then(|n| specs[by_name[*n]].keypoint),
                PointRef::Parent => parent[i].and_then(|p| effective[p]),
            };
            kp.ok_or_else(|| {
                ConvertError::SkeletonDefinition(format!(
                    "basis rule of {} references a joint without keypoint",
                    specs[i].name
                ))
            })
        };
        let resolve_dir = |i: usize, d: Option<DirSpec>| -> Result<Option<(usize, usize)>, ConvertError> {
            match d {
                Some((a, b)) => Ok(Some((resolve_ref(i, a)?, resolve_ref(i, b)?))),
                None => Ok(None),
            }
        };

        let mut joints = Vec::with_capacity(specs.len());
        for (i, spec) in specs.iter().enumerate() {
            let rule = match spec.basis {
                BasisSpec::InheritParent => BasisRule::InheritParent,
                BasisSpec::Axes { x, y, z, priority } => BasisRule::Axes {
                    x: resolve_dir(i, x)?,
                    y: resolve_dir(i, y)?,
                    z: resolve_dir(i, z)?,
                    priority,
                },
            };
            joints.push(Joint {
                name: spec.name,
                parent: parent[i],
                children: spec.children.iter().map(|n| by_name[*n]).collect(),
                keypoint: spec.keypoint,
                end_site: spec.end_site,
                direction: Vector3::new(spec.direction[0], spec.direction[1], spec.direction[2]),
                order: spec.order,
                rule,
            });
        }

        Ok(Self {
            variant,
            joints,
            root,
            by_name,
        })
    }

    pub fn variant(&self) -> &'static str {
        self.variant
    }

    pub fn root(&self) -> usize {
        self.root
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn joint(&self, index: usize) -> &Joint {
        &self.joints[index]
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn children_of(&self, index: usize) -> &[usize] {
        &self.joints[index].children
    }

    pub fn parent_of(&self, index: usize) -> Option<usize> {
        self.joints[index].parent
    }

    pub fn is_end_effector(&self, index: usize) -> bool {
        self.joints[index].end_site
    }

    pub fn rest_direction(&self, index: usize) -> Vector3<f32> {
        self.joints[index].direction
    }

    pub fn channel_order(&self, index: usize) -> Option<RotationOrder> {
        self.joints[index].order
    }

    /// 実効キーポイント: 自分か、キーポイントを持つ最も近い祖先
    pub fn effective_keypoint(&self, index: usize) -> Option<usize> {
        let mut i = index;
        loop {
            if let Some(kp) = self.joints[i].keypoint {
                return Some(kp);
            }
            i = self.joints[i].parent?;
        }
    }

    /// 決定的な行きがけ順トラバース（エンドサイト含む）
    ///
    /// チャンネル順は階層ブロックとモーションブロックで同一でなければ
    /// ならないため、子の順序はテーブルの記述順で固定される。
    pub fn preorder(&self) -> Vec<usize> {
        let mut result = Vec::with_capacity(self.joints.len());
        let mut stack = vec![self.root];
        while let Some(i) = stack.pop() {
            result.push(i);
            for &c in self.joints[i].children.iter().rev() {
                stack.push(c);
            }
        }
        result
    }

    /// 回転チャンネルを持つジョイント数（非エンドサイト）
    pub fn channel_joint_count(&self) -> usize {
        self.joints.iter().filter(|j| !j.end_site).count()
    }

    /// 1フレームあたりの総チャンネル数（ルート並進3 + 回転3×N）
    pub fn channels_per_frame(&self) -> usize {
        3 + 3 * self.channel_joint_count()
    }

    /// 定義・ルールが参照するキーポイントの最大インデックス
    pub fn max_keypoint(&self) -> Option<usize> {
        let mut max = None;
        let mut push = |kp: usize| {
            max = Some(max.map_or(kp, |m: usize| m.max(kp)));
        };
        for joint in &self.joints {
            if let Some(kp) = joint.keypoint {
                push(kp);
            }
            if let BasisRule::Axes { x, y, z, .. } = &joint.rule {
                for d in [x, y, z].into_iter().flatten() {
                    push(d.0);
                    push(d.1);
                }
            }
        }
        max
    }

    /// 左右対称ジョイントの名前を返す
    /// "Left"/"Right" 接頭辞と "L"/"R" + 大文字 形式の両方を扱う
    pub fn mirror_name(name: &str) -> Option<String> {
        if let Some(rest) = name.strip_prefix("Left") {
            return Some(format!("Right{rest}"));
        }
        if let Some(rest) = name.strip_prefix("Right") {
            return Some(format!("Left{rest}"));
        }
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some('L'), Some(c)) if c.is_ascii_uppercase() => Some(format!("R{}", &name[1..])),
            (Some('R'), Some(c)) if c.is_ascii_uppercase() => Some(format!("L{}", &name[1..])),
            _ => None,
        }
    }
}
