//! 设置栈与相对运动的属性测试（模拟设备）

use proptest::prelude::*;
use uarm_sdk::prelude::*;

proptest! {
    /// push → 任意修改 → pop 恢复原设置，速度始终在限制范围内
    #[test]
    fn push_modify_pop_restores(
        initial in 1.0f64..600.0,
        speeds in prop::collection::vec(-100.0f64..1000.0, 1..8),
    ) {
        let mut swift = SwiftBuilder::new().simulate().unwrap();
        swift.speed(initial);
        let before = (swift.current_speed(), swift.current_acceleration());

        swift.push_settings();
        for speed in &speeds {
            swift.speed(*speed);
            prop_assert!((1.0..=600.0).contains(&swift.current_speed()));
            swift.acceleration(speed / 10.0).unwrap();
            prop_assert!((0.01..=50.0).contains(&swift.current_acceleration()));
        }
        swift.pop_settings().unwrap();

        prop_assert_eq!((swift.current_speed(), swift.current_acceleration()), before);
        prop_assert_eq!(swift.settings_depth(), 0);
    }

    /// 相对移动后反向移动回到起点
    #[test]
    fn relative_move_round_trip(
        dx in -50.0f64..50.0,
        dy in -50.0f64..50.0,
        dz in -20.0f64..20.0,
    ) {
        let mut swift = SwiftBuilder::new().simulate().unwrap();
        let start = Position::new(150.0, 0.0, 40.0);
        swift.move_to(start.into(), true).unwrap();

        swift.move_relative(Target::new().x(dx).y(dy).z(dz), true).unwrap();
        swift.move_relative(Target::new().x(-dx).y(-dy).z(-dz), true).unwrap();

        let end = swift.position();
        // 每次移动都四舍五入到 3 位小数
        prop_assert!(end.distance_to(&start) < 2e-3);
    }
}
